//! Inline input widget kinds.
//!
//! A widget kind names the category of input control bound to a step; the
//! visual rendering lives with the UI surface and is out of scope here.

use serde::{Deserialize, Serialize};

/// The inline input widget a step presents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetKind {
    /// Plain text input.
    FreeText,
    /// Pick one of a fixed option list.
    SingleSelect { options: Vec<String> },
    /// Pick any number of a fixed option list.
    MultiSelect { options: Vec<String> },
    /// Capture a latitude/longitude pair (map tap or device location).
    CoordinateCapture,
    /// Capture a URL.
    UrlCapture,
    /// Searchable dropdown over states.
    StateSelect { options: Vec<String> },
    /// District picker pre-scoped to a state.
    DistrictSelect { state: String },
    /// Pick a pincode from a looked-up list.
    PincodeChoice { options: Vec<String> },
}

impl WidgetKind {
    /// Stable name of the widget kind, for logs and tests.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::FreeText => "free_text",
            Self::SingleSelect { .. } => "single_select",
            Self::MultiSelect { .. } => "multi_select",
            Self::CoordinateCapture => "coordinate_capture",
            Self::UrlCapture => "url_capture",
            Self::StateSelect { .. } => "state_select",
            Self::DistrictSelect { .. } => "district_select",
            Self::PincodeChoice { .. } => "pincode_choice",
        }
    }
}
