use std::fmt::{Display, Formatter};

/// Container an Opus input is wrapped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContainerFormat {
    Ogg,
    /// WebM or any other Matroska flavor.
    WebM,
}

impl Display for ContainerFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ogg => write!(f, "Ogg"),
            Self::WebM => write!(f, "WebM"),
        }
    }
}

/// Detect the container of the input.
///
/// Ogg wins when a capture pattern is found anywhere, WebM requires the EBML magic at the very
/// start.
pub fn detect_format(bytes: &[u8]) -> Option<ContainerFormat> {
    if ogg_page::find_start(bytes).is_some() {
        Some(ContainerFormat::Ogg)
    } else if ebml::is_ebml(bytes) {
        Some(ContainerFormat::WebM)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(detect_format(b"OggS\0"), Some(ContainerFormat::Ogg));
        assert_eq!(detect_format(b"\0\0OggS"), Some(ContainerFormat::Ogg));
        assert_eq!(
            detect_format(&[0x1A, 0x45, 0xDF, 0xA3, 0x80]),
            Some(ContainerFormat::WebM)
        );
        assert_eq!(detect_format(b"RIFF"), None);
        assert_eq!(detect_format(&[]), None);
    }

    #[test]
    fn test_ebml_magic_must_lead() {
        assert_eq!(detect_format(&[0x00, 0x1A, 0x45, 0xDF, 0xA3]), None);
    }
}
