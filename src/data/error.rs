use thiserror::Error;

/// Problems with the corpus or vector files. Any of them aborts the run.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus file '{path}' does not exist")]
    MissingFile { path: String },

    #[error("'{path}': header must be a text column followed by {expected:?}, found {found:?}")]
    HeaderMismatch {
        path:     String,
        expected: Vec<String>,
        found:    Vec<String>,
    },

    #[error("'{path}' line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        path:     String,
        line:     u64,
        expected: usize,
        found:    usize,
    },

    #[error("'{path}' line {line}: label '{column}' must be 0 or 1, found {value:?}")]
    InvalidLabel {
        path:   String,
        line:   u64,
        column: String,
        value:  String,
    },

    #[error("'{path}' line {line}: vector for {token:?} has {found} components, expected {expected}")]
    VectorWidth {
        path:     String,
        line:     usize,
        token:    String,
        expected: usize,
        found:    usize,
    },

    #[error("'{path}' line {line}: cannot parse vector component {value:?}")]
    VectorValue {
        path:  String,
        line:  usize,
        value: String,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = CorpusError::InvalidLabel {
            path:   "train.csv".into(),
            line:   3,
            column: "ORG".into(),
            value:  "yes".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("ORG"));
        assert!(msg.contains("yes"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<CorpusError>();
    }
}
