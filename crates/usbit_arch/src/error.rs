//! Error types for architecture selection and FAR decoding.

/// Errors produced while resolving an architecture or decoding a FAR value.
#[derive(Debug, thiserror::Error)]
pub enum ArchError {
    /// A device/architecture name did not match any architecture this crate
    /// understands.
    #[error("unsupported architecture: {name}")]
    UnsupportedArchitecture {
        /// The raw name that failed to resolve.
        name: String,
    },

    /// A FAR sub-field value did not fit within its architectural bit width.
    #[error("FAR field {field} value {value} does not fit in {width} bits")]
    FieldOverflow {
        /// Name of the offending sub-field (`block_type`, `row`, `col`, `minor`, `reserved`).
        field: &'static str,
        /// The value that overflowed.
        value: u32,
        /// The architectural width of the field, in bits.
        width: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unsupported_architecture() {
        let err = ArchError::UnsupportedArchitecture {
            name: "artix7".to_string(),
        };
        assert_eq!(format!("{err}"), "unsupported architecture: artix7");
    }

    #[test]
    fn display_field_overflow() {
        let err = ArchError::FieldOverflow {
            field: "minor",
            value: 200,
            width: 7,
        };
        assert_eq!(
            format!("{err}"),
            "FAR field minor value 200 does not fit in 7 bits"
        );
    }
}
