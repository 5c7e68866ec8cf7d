#![deny(missing_docs)]

//! # General API Metadata
//!
//! Parses document-level annotations from the main API file's doc
//! comments: title, version, host, base path, schemes, contact, license,
//! and tag descriptions.

use crate::spec::{Contact, License, Spec, Tag};

/// Applies general annotations from a doc comment block onto a document.
pub fn apply_general_info(spec: &mut Spec, doc: &[String]) {
    let mut description_lines: Vec<String> = Vec::new();
    let mut contact = Contact::default();
    let mut license_name: Option<String> = None;
    let mut license_url: Option<String> = None;

    for line in doc {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('@') else {
            continue;
        };
        let (attribute, value) = match rest.find(char::is_whitespace) {
            Some(end) => (rest[..end].to_lowercase(), rest[end..].trim_start()),
            None => (rest.to_lowercase(), ""),
        };

        match attribute.as_str() {
            "title" => spec.info.title = value.to_string(),
            "version" => spec.info.version = value.to_string(),
            "description" => description_lines.push(value.to_string()),
            "termsofservice" => spec.info.terms_of_service = Some(value.to_string()),
            "contact.name" => contact.name = Some(value.to_string()),
            "contact.url" => contact.url = Some(value.to_string()),
            "contact.email" => contact.email = Some(value.to_string()),
            "license.name" => license_name = Some(value.to_string()),
            "license.url" => license_url = Some(value.to_string()),
            "host" => spec.host = Some(value.to_string()),
            "basepath" => spec.base_path = Some(value.to_string()),
            "schemes" => {
                spec.schemes = value
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
            }
            "tag.name" => spec.tags.push(Tag {
                name: value.to_string(),
                description: None,
            }),
            "tag.description" => {
                if let Some(tag) = spec.tags.last_mut() {
                    tag.description = Some(value.to_string());
                }
            }
            _ => {}
        }
    }

    if !description_lines.is_empty() {
        spec.info.description = Some(description_lines.join("\n"));
    }
    if contact != Contact::default() {
        spec.info.contact = Some(contact);
    }
    if let Some(name) = license_name {
        spec.info.license = Some(License {
            name,
            url: license_url,
        });
    }
}
