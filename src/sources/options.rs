//! Command-line options that contribute configuration

/// What a triggered option contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionBinding {
    /// Merge a whole resource when the option is present.
    Resource { option: String, resource: String },
    /// Write the option's value (or `default` when it has none) at `path`.
    Path { option: String, path: String, default: Option<String> },
}

impl OptionBinding {
    pub fn resource(option: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::Resource { option: option.into(), resource: resource.into() }
    }

    pub fn path(option: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Path { option: option.into(), path: path.into(), default: None }
    }

    pub fn path_with_default(
        option: impl Into<String>,
        path: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        Self::Path { option: option.into(), path: path.into(), default: Some(default.into()) }
    }

    pub fn option(&self) -> &str {
        match self {
            Self::Resource { option, .. } | Self::Path { option, .. } => option,
        }
    }
}

/// An option found on the command line, with its value if one was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedOption {
    pub name: String,
    pub value: Option<String>,
}

impl DetectedOption {
    pub fn flag(name: impl Into<String>) -> Self {
        Self { name: name.into(), value: None }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: Some(value.into()) }
    }
}
