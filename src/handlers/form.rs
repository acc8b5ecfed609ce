// handlers/form.rs - request binding shared by the monster handlers
//
// Multipart forms are read into a flat field map first; typed requests are
// then built from the map so that validation never touches the stream.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;
use uuid::Uuid;

use crate::config::ImageConfig;
use crate::error::ApiError;
use crate::services::{CreateMonster, ImageUpload, UpdateMonster};
use crate::storage::extension_of;

/// Highest `monster_type_id[i]` index read from a request.
pub const MAX_TYPE_IDS: usize = 7;

/// Text fields plus the optional `image` file part.
#[derive(Debug, Default)]
pub struct MonsterForm {
    pub fields: HashMap<String, String>,
    pub image: Option<ImageUpload>,
}

impl MonsterForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = MonsterForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request("failed to binds the request body", e))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request("failed to binds the request body", e))?;
                if !bytes.is_empty() || !original_name.is_empty() {
                    form.image = Some(ImageUpload {
                        bytes: bytes.to_vec(),
                        original_name,
                    });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request("failed to binds the request body", e))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    fn parsed<T: FromStr>(&self, name: &str) -> Result<Option<T>, ApiError>
    where
        T::Err: std::fmt::Display,
    {
        match self.text(name) {
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| ApiError::bad_request("failed to binds the request body", format!("{}: {}", name, e))),
            None => Ok(None),
        }
    }

    /// Required field: present, parseable and not the type's zero value.
    fn required<T: FromStr + Default + PartialEq>(&self, name: &str) -> Result<T, ApiError>
    where
        T::Err: std::fmt::Display,
    {
        match self.parsed::<T>(name)? {
            Some(v) if v != T::default() => Ok(v),
            _ => Err(ApiError::bad_request("data input is invalid", format!("{} is required", name))),
        }
    }

    /// `length` is a real number; NaN and infinities are refused.
    fn length(&self) -> Result<Option<f32>, ApiError> {
        match self.parsed::<f32>("length")? {
            Some(v) if !v.is_finite() => Err(ApiError::bad_request(
                "failed to binds the request body",
                format!("length: {} is not a finite number", v),
            )),
            other => Ok(other),
        }
    }

    fn category_id(&self) -> Result<Option<Uuid>, ApiError> {
        match self.text("monster_category_id") {
            Some(raw) => Uuid::parse_str(raw)
                .map(Some)
                .map_err(|e| ApiError::bad_request("invalid monster category", e)),
            None => Ok(None),
        }
    }

    /// `monster_type_id[0]`, `monster_type_id[1]`, ... up to the first gap.
    pub fn type_ids(&self) -> Result<Vec<Uuid>, ApiError> {
        type_ids_from(&self.fields)
    }

    pub fn into_create(self, images: &ImageConfig) -> Result<CreateMonster, ApiError> {
        let name = self
            .text("name")
            .ok_or_else(|| ApiError::bad_request("data input is invalid", "name is required"))?
            .to_string();
        let monster_category_id = self
            .category_id()?
            .ok_or_else(|| ApiError::bad_request("data input is invalid", "monster_category_id is required"))?;
        let description = self
            .text("description")
            .ok_or_else(|| ApiError::bad_request("data input is invalid", "description is required"))?
            .to_string();

        let monster_type_ids = self.type_ids()?;
        if monster_type_ids.is_empty() {
            return Err(ApiError::bad_request("data input is invalid", "monster type is required"));
        }

        let req = CreateMonster {
            name,
            monster_category_id,
            description,
            length: self
                .length()?
                .filter(|l| *l != 0.0)
                .ok_or_else(|| ApiError::bad_request("data input is invalid", "length is required"))?,
            weight: self.required("weight")?,
            hp: self.required("hp")?,
            attack: self.required("attack")?,
            defends: self.required("defends")?,
            speed: self.required("speed")?,
            monster_type_ids,
            image: None,
        };
        Ok(CreateMonster {
            image: checked_image(self.image, images)?,
            ..req
        })
    }

    pub fn into_update(self, images: &ImageConfig) -> Result<UpdateMonster, ApiError> {
        let monster_type_ids = self.type_ids()?;
        let req = UpdateMonster {
            name: self.text("name").map(str::to_string),
            monster_category_id: self.category_id()?,
            description: self.text("description").map(str::to_string),
            length: self.length()?,
            weight: self.parsed("weight")?,
            hp: self.parsed("hp")?,
            attack: self.parsed("attack")?,
            defends: self.parsed("defends")?,
            speed: self.parsed("speed")?,
            is_caught: self.parsed("is_caught")?,
            monster_type_ids: if monster_type_ids.is_empty() { None } else { Some(monster_type_ids) },
            image: None,
        };
        Ok(UpdateMonster {
            image: checked_image(self.image, images)?,
            ..req
        })
    }
}

pub fn type_ids_from(fields: &HashMap<String, String>) -> Result<Vec<Uuid>, ApiError> {
    let mut ids = Vec::new();
    for i in 0..MAX_TYPE_IDS {
        let raw = fields
            .get(&format!("monster_type_id[{}]", i))
            .map(|s| s.trim())
            .unwrap_or_default();
        if raw.is_empty() {
            break;
        }
        let id = Uuid::parse_str(raw).map_err(|e| ApiError::bad_request("monster type must be uuid", e))?;
        ids.push(id);
    }
    Ok(ids)
}

/// Size and extension checks for an uploaded image.
pub fn checked_image(image: Option<ImageUpload>, config: &ImageConfig) -> Result<Option<ImageUpload>, ApiError> {
    let Some(image) = image else {
        return Ok(None);
    };
    if image.bytes.len() > config.max_bytes {
        return Err(ApiError::bad_request(
            "file cannot exceed 10 MB",
            format!("{} bytes", image.bytes.len()),
        ));
    }
    let extension = extension_of(&image.original_name);
    if !config.allowed_extensions.iter().any(|allowed| *allowed == extension) {
        return Err(ApiError::bad_request(
            "file format must be .png, .jpg, or .jpeg",
            image.original_name,
        ));
    }
    Ok(Some(image))
}

/// Path ids must be UUIDs.
pub fn monster_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| ApiError::bad_request("monster id not valid", e))
}
