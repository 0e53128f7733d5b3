use thiserror::Error;

/// Invalid session parameters. Raised while building an explorer or a
/// viewport; nothing is constructed when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("image dimensions must be positive: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("max_iter must be greater than zero")]
    InvalidMaxIter,

    #[error("scale must be a positive finite number, got {0}")]
    InvalidScale(f64),

    #[error("aspect must be a positive finite number, got {0}")]
    InvalidAspect(f64),

    #[error("zoom factor must be a positive finite number, got {0}")]
    InvalidZoomFactor(f64),

    #[error("plane region is empty: x [{x_min}, {x_max}], y [{y_min}, {y_max}]")]
    EmptyRegion {
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },

    #[error("unknown colormap: {0}")]
    UnknownColormap(String),

    #[error("unknown colour policy: {0}")]
    UnknownPolicy(String),

    #[error("unknown normalization: {0}")]
    UnknownNormalize(String),

    #[error("unknown solver strategy: {0}")]
    UnknownStrategy(String),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_messages_name_the_bad_value() {
        let err = ConfigError::InvalidDimensions {
            width: 0,
            height: 600,
        };
        assert_eq!(err.to_string(), "image dimensions must be positive: 0x600");
        assert_eq!(
            ConfigError::InvalidScale(-1.0).to_string(),
            "scale must be a positive finite number, got -1"
        );
    }
}
