use std::collections::HashMap;

use custom_error::custom_error;

use super::image::Image;

custom_error! {pub ImageIOError
    FailedToWrite {description: String} = "Failed to write image: {description}",
    InvalidOptions {description: String} = "Invalid options are set for this io operation: {description}",
}

pub trait ImageWriter {

    /// Encodes a sequence of images, in order, into a single output buffer.
    fn write(&self, images: &[Image], options: &WriterOptions) -> Result<Vec<u8>, ImageIOError>;
}

#[derive(Clone, Debug, Default)]
pub struct WriterOptions {

    options: HashMap<String, String>,
}

impl WriterOptions {

    pub fn with_option(&self, key: &str, value: &str) -> Self {
        let mut options = self.options.clone();
        options.insert(key.to_string(), value.to_string());

        Self {
            options,
        }
    }

    pub fn with_option_u32(&self, key: &str, value: u32) -> Self {
        self.with_option(key, &value.to_string())
    }

    pub fn with_option_bool(&self, key: &str, value: bool) -> Self {
        self.with_option(key, if value {
            "true"
        } else {
            "false"
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.options.get(key).map(|v| v.trim()).unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, ImageIOError> {
        let value = match self.options.get(key) {
            Some(v) => v,
            None => return Ok(default),
        };

        match value.to_lowercase().trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(ImageIOError::InvalidOptions {
                description: format!("failed to parse option value as a bool: {}", other),
            }),
        }
    }

    pub fn get_u32(&self, key: &str, default: u32) -> Result<u32, ImageIOError> {
        let value = match self.options.get(key) {
            Some(v) => v,
            None => return Ok(default),
        };

        value.trim().parse().map_err(|err| ImageIOError::InvalidOptions {
            description: format!("failed to parse option {} as u32: {}", key, err),
        })
    }
}
