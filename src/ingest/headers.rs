//! Header configuration for survey CSV files.
//!
//! The pipeline reads one postcode column plus one download and one upload
//! column per connection category. Defaults match the survey publication;
//! each can be replaced with an indexed override of the form
//! `"<category-index>:<header-name>"`.

use crate::category::Category;
use crate::constants::{
    CATEGORY_COUNT, DEFAULT_DOWNLOAD_CSV_HEADERS, DEFAULT_UPLOAD_CSV_HEADERS, POSTCODE_CSV_HEADER,
};
use crate::{Error, Result};
use std::collections::HashMap;

/// The full set of column headers the pipeline will read from each file
#[derive(Debug, Clone)]
pub struct HeaderPlan {
    /// Postcode column name
    pub postcode: String,
    /// Download-speed column names, indexed by category
    pub download: [String; CATEGORY_COUNT],
    /// Upload-speed column names, indexed by category
    pub upload: [String; CATEGORY_COUNT],
}

impl HeaderPlan {
    /// Build a header plan from an optional postcode header and indexed
    /// download/upload overrides.
    ///
    /// Fails on a malformed override, an unknown category index, or any
    /// duplicate among the resulting target headers — all before a single
    /// file is opened.
    pub fn new(
        postcode_header: Option<&str>,
        down_overrides: &[String],
        up_overrides: &[String],
    ) -> Result<Self> {
        let mut download = DEFAULT_DOWNLOAD_CSV_HEADERS.map(str::to_string);
        let mut upload = DEFAULT_UPLOAD_CSV_HEADERS.map(str::to_string);

        for arg in down_overrides {
            apply_override(&mut download, arg)?;
        }
        for arg in up_overrides {
            apply_override(&mut upload, arg)?;
        }

        let plan = Self {
            postcode: postcode_header.unwrap_or(POSTCODE_CSV_HEADER).to_string(),
            download,
            upload,
        };
        plan.validate_distinct()?;
        Ok(plan)
    }

    /// Iterate every configured target header: postcode first, then the
    /// download and upload headers in category order
    pub fn all(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.postcode.as_str())
            .chain(self.download.iter().map(String::as_str))
            .chain(self.upload.iter().map(String::as_str))
    }

    fn validate_distinct(&self) -> Result<()> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for header in self.all() {
            *counts.entry(header).or_default() += 1;
        }

        let mut duplicates: Vec<&str> = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(header, _)| header)
            .collect();

        if duplicates.is_empty() {
            Ok(())
        } else {
            duplicates.sort_unstable();
            Err(Error::configuration(format!(
                "Duplicate header names for csv: {duplicates:?}"
            )))
        }
    }
}

/// Apply one `"<index>:<name>"` override to a category-indexed header slot
fn apply_override(slots: &mut [String; CATEGORY_COUNT], arg: &str) -> Result<()> {
    let invalid = || Error::configuration(format!("Invalid indexed header '{arg}'"));

    let (index, name) = arg.split_once(':').ok_or_else(invalid)?;
    let category = Category::from_index(index).ok_or_else(invalid)?;

    slots[category.index()] = name.to_string();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let plan = HeaderPlan::new(None, &[], &[]).unwrap();
        assert_eq!(plan.postcode, "postcode");
        assert_eq!(plan.download[0], "Average download speed (Mbit/s)");
        assert_eq!(
            plan.upload[4],
            "Average upload speed (Mbit/s) for UFBB lines"
        );
        assert_eq!(plan.all().count(), 11);
    }

    #[test]
    fn test_override_replaces_only_its_category() {
        let plan =
            HeaderPlan::new(None, &["3:SFBB down".to_string()], &[]).unwrap();
        assert_eq!(plan.download[3], "SFBB down");
        assert_eq!(plan.download[0], "Average download speed (Mbit/s)");
        assert_eq!(plan.upload[3], "Average upload speed (Mbit/s) for SFBB lines");
    }

    #[test]
    fn test_override_name_may_contain_colons() {
        let plan = HeaderPlan::new(None, &[], &["0:Speed: upload".to_string()]).unwrap();
        assert_eq!(plan.upload[0], "Speed: upload");
    }

    #[test]
    fn test_malformed_override_fails() {
        for bad in ["no-colon", "9:Header", "x:Header", ":Header"] {
            let result = HeaderPlan::new(None, &[bad.to_string()], &[]);
            assert!(
                matches!(result, Err(Error::Configuration { .. })),
                "expected configuration error for {bad:?}"
            );
        }
    }

    #[test]
    fn test_duplicate_target_headers_fail() {
        // Postcode header colliding with a download header
        let result =
            HeaderPlan::new(Some("Average download speed (Mbit/s)"), &[], &[]);
        assert!(matches!(result, Err(Error::Configuration { .. })));

        // Two categories mapped to the same column
        let result = HeaderPlan::new(
            None,
            &["0:Shared".to_string(), "1:Shared".to_string()],
            &[],
        );
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }
}
