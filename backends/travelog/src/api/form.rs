use std::collections::HashMap;

use axum::{body::Bytes, extract::Multipart};

use crate::error::{AppError, AppResult};

const DEFAULT_MIMETYPE: &str = "application/octet-stream";

#[derive(Debug)]
pub struct UploadedFile {
    pub field: String,
    pub filename: String,
    pub mimetype: String,
    pub bytes: Bytes,
}

/// A multipart body read fully into memory: text fields by name, files in
/// the order they were sent.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: Vec<UploadedFile>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            let Some(filename) = field.file_name().map(str::to_string) else {
                let text = field.text().await?;
                form.fields.insert(name, text);
                continue;
            };

            let mimetype = field
                .content_type()
                .unwrap_or(DEFAULT_MIMETYPE)
                .to_string();
            let bytes = field.bytes().await?;

            // Browsers send an empty part for a file input left blank.
            if filename.is_empty() && bytes.is_empty() {
                continue;
            }

            form.files.push(UploadedFile {
                field: name,
                filename,
                mimetype,
                bytes,
            });
        }

        Ok(form)
    }

    /// First non-blank value among `names`, trimmed.
    pub fn text(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|name| self.fields.get(*name))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
    }

    pub fn required(&self, names: &[&str]) -> AppResult<&str> {
        self.text(names)
            .ok_or_else(|| AppError::bad_request(format!("{} is required", names[0])))
    }

    pub fn files<'a>(&'a self, names: &'a [&'a str]) -> impl Iterator<Item = &'a UploadedFile> {
        self.files
            .iter()
            .filter(move |file| names.iter().any(|name| *name == file.field))
    }

    #[cfg(test)]
    pub fn with_fields(pairs: &[(&str, &str)]) -> Self {
        FormData {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: Vec::new(),
        }
    }
}
