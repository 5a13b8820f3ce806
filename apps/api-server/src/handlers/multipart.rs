//! Buffering of multipart form bodies.

use actix_multipart::{Field, Multipart};
use futures::TryStreamExt;

use crate::middleware::error::{AppError, AppResult};

/// Name of the file field on post and upload forms.
pub const IMAGE_FIELD: &str = "image";

/// An uploaded image held in memory.
#[derive(Debug)]
pub struct ImageFile {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Text fields in arrival order plus the optional image.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    pub image: Option<ImageFile>,
}

impl MultipartForm {
    /// First value of a text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value of a repeated text field.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Most parts a single form may carry.
pub const MAX_PARTS: usize = 64;

/// Combined size of every text field in one form.
pub const TEXT_LIMIT: usize = 1024 * 1024;

/// Read a whole multipart body.
///
/// The image must be `image/*` and at most `max_bytes`. Text fields share
/// [`TEXT_LIMIT`] and the form may hold at most [`MAX_PARTS`] parts. An
/// `image` part without a filename is an ordinary text field, e.g. the path
/// of an earlier upload. Nothing is written anywhere.
pub async fn read_form(mut payload: Multipart, max_bytes: usize) -> AppResult<MultipartForm> {
    let mut form = MultipartForm::default();
    let mut parts = 0;
    let mut text_left = TEXT_LIMIT;

    while let Some(mut field) = payload.try_next().await.map_err(bad_multipart)? {
        parts += 1;
        if parts > MAX_PARTS {
            return Err(AppError::BadRequest(format!(
                "Too many form fields. At most {MAX_PARTS} are allowed."
            )));
        }

        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(String::from);

        if name == IMAGE_FIELD && file_name.is_some() {
            let is_image = field
                .content_type()
                .is_some_and(|mime| mime.type_() == mime::IMAGE);

            // Browsers send an empty part when no file was picked
            if file_name.as_deref() == Some("") && !is_image {
                read_limited(&mut field, max_bytes, too_large_file).await?;
                continue;
            }
            if !is_image {
                return Err(AppError::BadRequest(
                    "Only image files are allowed!".to_string(),
                ));
            }

            let bytes = read_limited(&mut field, max_bytes, too_large_file).await?;
            form.image = Some(ImageFile { file_name, bytes });
        } else {
            let bytes = read_limited(&mut field, text_left, too_large_text).await?;
            text_left -= bytes.len();
            let value = String::from_utf8(bytes).map_err(|_| {
                AppError::BadRequest(format!("Field '{name}' is not valid UTF-8"))
            })?;
            form.fields.push((name, value));
        }
    }

    Ok(form)
}

fn too_large_file(max_bytes: usize) -> AppError {
    AppError::BadRequest(format!(
        "File too large. Maximum size is {}MB.",
        max_bytes.div_ceil(1024 * 1024)
    ))
}

fn too_large_text(_: usize) -> AppError {
    AppError::BadRequest(format!(
        "Form fields too large. At most {}KB of text is allowed.",
        TEXT_LIMIT / 1024
    ))
}

async fn read_limited(
    field: &mut Field,
    max_bytes: usize,
    too_large: fn(usize) -> AppError,
) -> AppResult<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(bad_multipart)? {
        if bytes.len() + chunk.len() > max_bytes {
            return Err(too_large(max_bytes));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn bad_multipart(err: actix_multipart::MultipartError) -> AppError {
    AppError::BadRequest(err.to_string())
}

/// Values of a list field sent either repeated or comma-separated.
pub fn split_list<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

/// HTML-form style boolean.
pub fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}
