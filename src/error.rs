use std::fmt;

#[derive(Debug)]
pub enum SeedPressError {
    UnsupportedTemplateVersion(u32),
    InvalidLayout(String),
    Io(std::io::Error),
}

impl fmt::Display for SeedPressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedPressError::UnsupportedTemplateVersion(version) => {
                write!(f, "unsupported template version: {}", version)
            }
            SeedPressError::InvalidLayout(message) => {
                write!(f, "invalid layout: {}", message)
            }
            SeedPressError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for SeedPressError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SeedPressError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SeedPressError {
    fn from(value: std::io::Error) -> Self {
        SeedPressError::Io(value)
    }
}
