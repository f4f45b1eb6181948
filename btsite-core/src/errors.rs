//! Error types for tracker site clients.

use thiserror::Error;

use crate::engine::EngineError;

/// Errors that can occur while building or driving a site client.
#[derive(Debug, Error)]
pub enum SiteError {
    /// No configuration is registered for the site code.
    #[error("站点配置不存在: {code}")]
    ConfigNotFound {
        /// The site code that was looked up
        code: String,
    },

    /// The site declares an architecture no client is registered for.
    #[error("无效架构: {schema}")]
    InvalidSchema {
        /// The declared architecture identifier
        schema: String,
    },

    /// A site operation failed; wraps the underlying cause with site context.
    #[error("站点({site}){operation}, 异常: {source}")]
    Operation {
        /// Display name of the site
        site: String,
        /// Short label of the failed operation
        operation: String,
        /// The underlying failure
        #[source]
        source: Box<SiteError>,
    },

    /// The site adaptation engine reported a failure.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Engine output could not be decoded into the expected record.
    #[error("Decode error: {reason}")]
    Decode {
        /// The reason decoding failed
        reason: String,
    },

    /// A URL or URL reference could not be parsed.
    #[error("error parsing URL '{url}': {reason}")]
    UrlParse {
        /// The offending input
        url: String,
        /// The parser's complaint
        reason: String,
    },

    /// RSS document could not be parsed.
    #[error("RSS parse error: {reason}")]
    RssParse {
        /// The reason for the parse failure
        reason: String,
    },

    /// The site refused to mark messages as read.
    #[error("未读消息设为已读失败: {message}")]
    MarkAsRead {
        /// Message returned by the site
        message: String,
    },

    /// A paginated listing did not terminate within the configured page cap.
    #[error("Pagination exceeded {pages} pages")]
    PaginationLimit {
        /// The page cap that was hit
        pages: usize,
    },
}

impl SiteError {
    /// Wraps an error with the site name and a short operation label.
    pub fn operation(site: &str, operation: impl Into<String>, source: impl Into<SiteError>) -> Self {
        SiteError::Operation {
            site: site.to_string(),
            operation: operation.into(),
            source: Box::new(source.into()),
        }
    }

    /// Checks if this error prevents a client from being constructed at all.
    pub fn is_config_error(&self) -> bool {
        match self {
            SiteError::ConfigNotFound { .. } | SiteError::InvalidSchema { .. } => true,
            SiteError::Operation { source, .. } => source.is_config_error(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for SiteError {
    fn from(error: serde_json::Error) -> Self {
        SiteError::Decode {
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_message_names_site_and_operation() {
        let error = SiteError::operation(
            "Example",
            "搜索异常",
            EngineError::Transport {
                reason: "connection reset".to_string(),
            },
        );

        assert_eq!(
            error.to_string(),
            "站点(Example)搜索异常, 异常: Transport error: connection reset"
        );
        assert!(!error.is_config_error());
    }

    #[test]
    fn test_config_errors_are_detected_through_wrapping() {
        let error = SiteError::operation(
            "Example",
            "做种信息失败",
            SiteError::ConfigNotFound {
                code: "example".to_string(),
            },
        );
        assert!(error.is_config_error());

        let schema = SiteError::InvalidSchema {
            schema: "Gazelle".to_string(),
        };
        assert_eq!(schema.to_string(), "无效架构: Gazelle");
    }
}
