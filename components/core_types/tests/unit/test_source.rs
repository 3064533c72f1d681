//! Unit tests for SourcePosition

use core_types::SourcePosition;

#[cfg(test)]
mod source_position_tests {
    use super::*;

    #[test]
    fn test_source_position_creation() {
        let pos = SourcePosition {
            line: 10,
            column: 5,
            offset: 150,
        };

        assert_eq!(pos.line, 10);
        assert_eq!(pos.column, 5);
        assert_eq!(pos.offset, 150);
    }

    #[test]
    fn test_source_position_display() {
        let pos = SourcePosition {
            line: 3,
            column: 14,
            offset: 40,
        };
        assert_eq!(pos.to_string(), "3:14");
    }
}
