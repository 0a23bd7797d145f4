pub mod boards;
pub mod invitations;
pub mod tasks;
pub mod users;

use axum::extract::Multipart;
use platform_api::ApiError;
use platform_storage::UploadFile;
use products_taskboard::TaskChangeset;
use tracing::debug;

/// Reads a multipart task update. File parts become uploads; everything else
/// is a text field. Unrecognised names are skipped.
pub async fn read_changeset(mut multipart: Multipart) -> Result<TaskChangeset, ApiError> {
    let mut changeset = TaskChangeset::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::invalid(err.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let accepted = match field
            .file_name()
            .filter(|file_name| !file_name.is_empty())
            .map(str::to_string)
        {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::invalid(err.body_text()))?;
                let mut upload = UploadFile::new(file_name, bytes.to_vec());
                if let Some(content_type) = content_type {
                    upload = upload.with_content_type(content_type);
                }
                changeset.set_file(&name, upload)
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| ApiError::invalid(err.body_text()))?;
                changeset.set_text(&name, value)
            }
        };
        if !accepted {
            debug!(field = %name, "ignoring unknown multipart field");
        }
    }
    Ok(changeset)
}
