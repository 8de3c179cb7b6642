// Property search request checks, run before any enrichment call
use crate::input::SearchRequest;
use crate::patterns::is_po_box;
use shared_types::{ValidationError, ValidationReport};

pub const MIN_ADDRESS_TOKENS: usize = 3;

pub fn check_search_request(request: &SearchRequest) -> ValidationReport {
    let mut report = ValidationReport::valid();
    let address = request.address.trim();

    if address.is_empty() {
        report.push(ValidationError::error("address", "Address is required"));
        return report;
    }

    if is_po_box(address) {
        report.push(
            ValidationError::error(
                "address",
                "PO Box addresses cannot be used for property searches",
            )
            .with_suggestion("Enter the physical street address of the property"),
        );
    }

    if address.split_whitespace().count() < MIN_ADDRESS_TOKENS {
        report.push(
            ValidationError::warning("address", "Address looks incomplete")
                .with_suggestion("Include street number, street name and city"),
        );
    }

    report
}
