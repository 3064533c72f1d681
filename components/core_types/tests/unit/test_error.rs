//! Unit tests for EasyTestsError

use core_types::{EasyTestsError, SourcePosition};
use std::error::Error;
use std::io;
use std::path::PathBuf;

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_usage_error_message_names_file() {
        let error = EasyTestsError::UnsupportedExtension {
            path: PathBuf::from("suite.json"),
        };
        assert!(error.is_usage());
        assert!(error.to_string().contains("suite.json"));
        assert!(error.to_string().contains("`.mts`"));
    }

    #[test]
    fn test_resolution_error_keeps_io_source() {
        let error = EasyTestsError::Resolution {
            specifier: "./missing".to_string(),
            path: PathBuf::from("/tmp/missing"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(error.is_resolution());

        let source = error.source().expect("io error is the source");
        let io_error = source.downcast_ref::<io::Error>().expect("io::Error");
        assert_eq!(io_error.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_compile_error_with_position() {
        let error = EasyTestsError::Compile {
            path: PathBuf::from("a.ts"),
            message: "Unterminated string".to_string(),
            position: Some(SourcePosition {
                line: 2,
                column: 7,
                offset: 12,
            }),
        };
        assert!(error.is_compile());
        assert_eq!(
            error.to_string(),
            "failed to compile a.ts:2:7: Unterminated string"
        );
    }

    #[test]
    fn test_compile_error_without_position() {
        let error = EasyTestsError::compile("b.js", "no output");
        assert_eq!(error.to_string(), "failed to compile b.js: no output");
    }

    #[test]
    fn test_timeout_is_not_evaluation() {
        let timeout = EasyTestsError::Timeout {
            test: "slow".to_string(),
        };
        assert!(timeout.is_timeout());
        assert!(!timeout.is_evaluation());
        assert_eq!(timeout.to_string(), "Test slow timed out.");
    }

    #[test]
    fn test_io_conversion() {
        let error: EasyTestsError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert!(matches!(error, EasyTestsError::Io(_)));
    }
}
