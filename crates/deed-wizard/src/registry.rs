//! Document type registry and step metadata

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared_types::{AiCapability, DocumentType, FieldKind, FieldSpec, StepConfig};

/// Steps and metadata for one document type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypeConfig {
    pub document_type: DocumentType,
    pub name: String,
    pub description: String,
    pub estimated_minutes: u32,
    pub steps: Vec<StepConfig>,
}

impl DocumentTypeConfig {
    pub fn step(&self, step_id: &str) -> Option<&StepConfig> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    /// 1-based position of a step
    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id).map(|i| i + 1)
    }

    /// Step holding a field, if any
    pub fn step_for_field(&self, field: &str) -> Option<&StepConfig> {
        self.steps.iter().find(|s| s.has_field(field))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.steps
            .iter()
            .flat_map(|s| s.fields.iter().map(|f| f.name.as_str()))
    }
}

/// Static configuration consumed by the wizard
#[derive(Debug, Clone, Default)]
pub struct DocumentTypeRegistry {
    configs: BTreeMap<DocumentType, DocumentTypeConfig>,
}

impl DocumentTypeRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// All five California deed types
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for config in standard_configs() {
            registry.register(config);
        }
        registry
    }

    pub fn register(&mut self, config: DocumentTypeConfig) {
        self.configs.insert(config.document_type, config);
    }

    pub fn get(&self, document_type: DocumentType) -> Option<&DocumentTypeConfig> {
        self.configs.get(&document_type)
    }

    pub fn contains(&self, document_type: DocumentType) -> bool {
        self.configs.contains_key(&document_type)
    }

    pub fn list(&self) -> Vec<&DocumentTypeConfig> {
        self.configs.values().collect()
    }
}

fn field(name: &str, label: &str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec {
        name: name.to_string(),
        label: label.to_string(),
        kind,
        required,
    }
}

fn text(max_len: usize) -> FieldKind {
    FieldKind::Text { max_len }
}

fn choice(options: &[&str]) -> FieldKind {
    FieldKind::Choice {
        options: options.iter().map(|o| o.to_string()).collect(),
    }
}

fn property_step() -> StepConfig {
    StepConfig {
        id: "property".to_string(),
        title: "Property Information".to_string(),
        help: "Confirm the address, APN and legal description exactly as they appear on the \
               current vesting deed."
            .to_string(),
        fields: vec![
            field("property_address", "Property address", text(500), true),
            field("apn", "Assessor's parcel number", FieldKind::Apn, true),
            field("county", "County", text(100), true),
            field("legal_description", "Legal description", FieldKind::LongText, true),
        ],
        ai_capabilities: vec![AiCapability::FieldSuggestions, AiCapability::NaturalLanguage],
    }
}

fn parties_step(grantor_help: &str) -> StepConfig {
    StepConfig {
        id: "parties".to_string(),
        title: "Grantor and Grantee".to_string(),
        help: grantor_help.to_string(),
        fields: vec![
            field("grantor", "Grantor", text(500), true),
            field("grantee", "Grantee", text(500), true),
            field("vesting", "Grantee vesting", text(200), false),
        ],
        ai_capabilities: vec![
            AiCapability::FieldSuggestions,
            AiCapability::NaturalLanguage,
            AiCapability::DocumentTypeRecommendation,
        ],
    }
}

fn consideration_step(price_required: bool) -> StepConfig {
    StepConfig {
        id: "consideration".to_string(),
        title: "Consideration and Transfer Tax".to_string(),
        help: "Documentary transfer tax is computed from the sale price. Enter the city only \
               if the property is inside city limits."
            .to_string(),
        fields: vec![
            field("sale_price", "Sale price", FieldKind::Currency, price_required),
            field("city", "City", text(100), false),
        ],
        ai_capabilities: vec![AiCapability::TransferTax, AiCapability::FieldSuggestions],
    }
}

fn recording_step() -> StepConfig {
    StepConfig {
        id: "recording".to_string(),
        title: "Recording Information".to_string(),
        help: "Who requested recording and where the recorded deed should be mailed."
            .to_string(),
        fields: vec![
            field("recording_requested_by", "Recording requested by", text(200), true),
            field("mail_to_name", "Mail to", text(200), true),
            field("mail_to_address", "Mailing address", FieldKind::LongText, true),
        ],
        ai_capabilities: vec![AiCapability::DocumentValidation],
    }
}

fn standard_configs() -> Vec<DocumentTypeConfig> {
    vec![
        DocumentTypeConfig {
            document_type: DocumentType::GrantDeed,
            name: DocumentType::GrantDeed.display_name().to_string(),
            description: "Transfers ownership with implied warranties that the grantor has not \
                          conveyed the property to anyone else and that it is free of \
                          undisclosed encumbrances."
                .to_string(),
            estimated_minutes: 15,
            steps: vec![
                property_step(),
                parties_step("The grantor must match the current owner of record."),
                consideration_step(true),
                recording_step(),
            ],
        },
        DocumentTypeConfig {
            document_type: DocumentType::QuitclaimDeed,
            name: DocumentType::QuitclaimDeed.display_name().to_string(),
            description: "Releases whatever interest the grantor holds, with no warranty of \
                          title."
                .to_string(),
            estimated_minutes: 10,
            steps: vec![
                property_step(),
                parties_step("The grantor releases only the interest they actually hold."),
                consideration_step(false),
                recording_step(),
            ],
        },
        DocumentTypeConfig {
            document_type: DocumentType::InterspousalTransfer,
            name: DocumentType::InterspousalTransfer.display_name().to_string(),
            description: "Transfers property between spouses; exempt from documentary \
                          transfer tax."
                .to_string(),
            estimated_minutes: 12,
            steps: vec![
                property_step(),
                parties_step("Grantor and grantee must be spouses or registered domestic partners."),
                StepConfig {
                    id: "transfer".to_string(),
                    title: "Transfer Details".to_string(),
                    help: "The reason for the transfer determines the exemption claimed."
                        .to_string(),
                    fields: vec![field(
                        "transfer_reason",
                        "Reason for transfer",
                        choice(&[
                            "adding_spouse",
                            "removing_spouse",
                            "divorce_settlement",
                            "change_vesting",
                        ]),
                        true,
                    )],
                    ai_capabilities: vec![AiCapability::NaturalLanguage],
                },
                recording_step(),
            ],
        },
        DocumentTypeConfig {
            document_type: DocumentType::WarrantyDeed,
            name: DocumentType::WarrantyDeed.display_name().to_string(),
            description: "Transfers ownership with express warranties of title.".to_string(),
            estimated_minutes: 20,
            steps: vec![
                property_step(),
                parties_step("The grantor must match the current owner of record."),
                StepConfig {
                    id: "warranties".to_string(),
                    title: "Warranties".to_string(),
                    help: "A general warranty covers the full chain of title; a special \
                           warranty covers only the grantor's period of ownership."
                        .to_string(),
                    fields: vec![
                        field("warranty_scope", "Warranty scope", choice(&["general", "special"]), true),
                        field("exceptions", "Exceptions to warranty", FieldKind::LongText, false),
                    ],
                    ai_capabilities: vec![AiCapability::NaturalLanguage],
                },
                consideration_step(true),
                recording_step(),
            ],
        },
        DocumentTypeConfig {
            document_type: DocumentType::TaxDeed,
            name: DocumentType::TaxDeed.display_name().to_string(),
            description: "Conveys property sold at a tax-defaulted property sale.".to_string(),
            estimated_minutes: 15,
            steps: vec![
                property_step(),
                StepConfig {
                    id: "sale".to_string(),
                    title: "Tax Sale".to_string(),
                    help: "Details of the tax collector's sale.".to_string(),
                    fields: vec![
                        field("tax_collector", "Tax collector", text(200), true),
                        field("sale_date", "Sale date", FieldKind::Date, true),
                        field("sale_price", "Sale price", FieldKind::Currency, true),
                    ],
                    ai_capabilities: vec![AiCapability::TransferTax],
                },
                parties_step("The grantor is the tax collector conveying on behalf of the county."),
                recording_step(),
            ],
        },
    ]
}
