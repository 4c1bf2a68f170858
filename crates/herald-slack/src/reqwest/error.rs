//! Classification of reqwest failures.

use crate::Error;

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Error::timeout()
                .with_message(error.to_string())
                .with_source(error)
        } else if error.is_connect() {
            Error::network_error()
                .with_message("Connection failed")
                .with_source(error)
        } else if error.is_builder() {
            Error::configuration()
                .with_message(error.to_string())
                .with_source(error)
        } else {
            Error::network_error()
                .with_message(error.to_string())
                .with_source(error)
        }
    }
}
