// Property record checks: structure first, then advisory heuristics
use crate::input::PropertyData;
use crate::patterns::{has_state_marker, is_california_county, is_recognized_vesting, is_valid_apn};
use shared_types::{ValidationError, ValidationReport};

pub const MIN_ADDRESS_LEN: usize = 10;

pub fn check_property_data(data: &PropertyData) -> ValidationReport {
    let mut report = ValidationReport::valid();

    let address = data.address.trim();
    if address.chars().count() < MIN_ADDRESS_LEN {
        report.push(
            ValidationError::error(
                "address",
                format!("Address must be at least {} characters", MIN_ADDRESS_LEN),
            )
            .with_suggestion("Enter the full street address, city, state and ZIP"),
        );
    } else if !has_state_marker(address) {
        report.push(
            ValidationError::warning("address", "Address does not include a state")
                .with_suggestion("Append the state abbreviation, e.g. \", CA 90210\""),
        );
    }

    let county = data.county.trim();
    if county.is_empty() {
        report.push(
            ValidationError::error("county", "County is required")
                .with_legal_basis("Cal. Gov. Code § 27201"),
        );
    } else if !is_california_county(county) {
        report.push(
            ValidationError::warning(
                "county",
                format!("County '{}' is not a recognized California county", county),
            )
            .with_suggestion("Check the spelling of the county name"),
        );
    }

    if let Some(apn) = data.apn.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        if !is_valid_apn(apn) {
            report.push(
                ValidationError::warning(
                    "apn",
                    format!("APN '{}' does not match the expected format", apn),
                )
                .with_suggestion("Use DDD-DDD-DDD or 8-12 digits"),
            );
        }
    }

    for (i, owner) in data.current_owners.iter().enumerate() {
        let field = format!("currentOwners[{}].name", i);
        if owner.name.trim().is_empty() {
            report.push(ValidationError::error(field, "Owner name cannot be empty"));
            continue;
        }
        if let Some(vesting) = owner.vesting_type.as_deref().filter(|v| !v.trim().is_empty()) {
            if !is_recognized_vesting(vesting) {
                report.push(
                    ValidationError::warning(
                        format!("currentOwners[{}].vestingType", i),
                        format!("Unusual vesting phrase: '{}'", vesting),
                    )
                    .with_suggestion("Confirm the vesting with a title professional"),
                );
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Owner;

    fn data(address: &str, apn: Option<&str>, county: &str, owners: &[&str]) -> PropertyData {
        PropertyData {
            address: address.to_string(),
            apn: apn.map(String::from),
            county: county.to_string(),
            current_owners: owners.iter().map(|n| Owner::new(*n)).collect(),
            liens: Vec::new(),
        }
    }

    #[test]
    fn test_accepts_complete_record() {
        let report = check_property_data(&data(
            "123 Main St, Los Angeles, CA 90210",
            Some("123-456-789"),
            "Los Angeles",
            &["John Doe"],
        ));
        assert!(report.is_valid);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_short_address_is_error() {
        let report = check_property_data(&data("123", None, "Orange", &["A"]));
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.field == "address"));
    }

    #[test]
    fn test_missing_county_is_error() {
        let report = check_property_data(&data("123 Main St, Irvine, CA", None, "  ", &["A"]));
        assert!(report.errors.iter().any(|e| e.field == "county"));
    }

    #[test]
    fn test_missing_state_is_warning() {
        let report = check_property_data(&data("123 Main Street Irvine", None, "Orange", &["A"]));
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.field == "address"));
    }

    #[test]
    fn test_empty_owner_name_reports_index() {
        let report = check_property_data(&data(
            "123 Main St, Irvine, CA",
            None,
            "Orange",
            &["Jane", " "],
        ));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].field, "currentOwners[1].name");
    }

    #[test]
    fn test_unusual_vesting_warns() {
        let mut d = data("123 Main St, Irvine, CA", None, "Orange", &["Jane"]);
        d.current_owners[0].vesting_type = Some("by handshake".into());
        let report = check_property_data(&d);
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.message.contains("vesting")));

        d.current_owners[0].vesting_type = Some("Joint Tenants".into());
        assert!(check_property_data(&d).warnings.is_empty());
    }
}
