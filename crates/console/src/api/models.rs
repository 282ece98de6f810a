//! Data transfer objects exchanged with the identity API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::menu::{MenuGroup, MenuItem};

/// Token issuance request.
///
/// Field names follow the OAuth2-style snake_case wire names.
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub application_id: String,
    pub application_secret: String,
    pub company_id: String,
    pub user_id: String,
    pub user_secret: String,
}

/// Grant type the console always requests.
pub const GRANT_CLIENT_CREDENTIALS: &str = "ClientCredentials";

/// Token issuance response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Generic dropdown entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: String,
    #[serde(default)]
    pub name_translation_key: Option<String>,
}

/// One entry of a culture's translation catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CultureTranslation {
    #[serde(default)]
    pub translation_key: Option<String>,
    #[serde(default)]
    pub translation_value: Option<String>,
}

/// Menu group as sent by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuGroupDto {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<MenuItemDto>>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
}

/// Menu item as sent by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemDto {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub can_view: Option<bool>,
    #[serde(default)]
    pub can_edit: Option<bool>,
    #[serde(default)]
    pub can_delete: Option<bool>,
    #[serde(default)]
    pub can_create: Option<bool>,
}

fn default_true() -> bool {
    true
}

impl From<MenuGroupDto> for MenuGroup {
    fn from(dto: MenuGroupDto) -> Self {
        MenuGroup {
            id: dto.id.unwrap_or_default(),
            title: dto.title.unwrap_or_default(),
            description: dto.description.unwrap_or_default(),
            icon: dto.icon.unwrap_or_default(),
            items: dto
                .items
                .unwrap_or_default()
                .into_iter()
                .map(MenuItem::from)
                .collect(),
            is_visible: dto.is_visible,
        }
    }
}

impl From<MenuItemDto> for MenuItem {
    // Absent flags mean "not granted"
    fn from(dto: MenuItemDto) -> Self {
        MenuItem {
            id: dto.id.unwrap_or_default(),
            title: dto.title.unwrap_or_default(),
            description: dto.description.unwrap_or_default(),
            icon: dto.icon.unwrap_or_default(),
            path: dto.path.unwrap_or_default(),
            is_visible: dto.is_visible,
            can_view: dto.can_view.unwrap_or(false),
            can_edit: dto.can_edit.unwrap_or(false),
            can_delete: dto.can_delete.unwrap_or(false),
            can_create: dto.can_create.unwrap_or(false),
        }
    }
}

/// Company record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name_translation_key: Option<String>,
    #[serde(default)]
    pub name_translation_value: Option<String>,
    #[serde(default)]
    pub description_translation_key: Option<String>,
    #[serde(default)]
    pub description_translation_value: Option<String>,
    #[serde(default)]
    pub subdomain: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub default_culture_fk: Option<String>,
    #[serde(default)]
    pub country_fk: Option<String>,
    #[serde(default)]
    pub default_culture_name_translation_key: Option<String>,
    #[serde(default)]
    pub country_name_translation_key: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_system_company: bool,
}

/// Application record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name_translation_key: Option<String>,
    #[serde(default)]
    pub name_translation_value: Option<String>,
    #[serde(default)]
    pub description_translation_key: Option<String>,
    #[serde(default)]
    pub description_translation_value: Option<String>,
    #[serde(default)]
    pub application_client: Option<String>,
    #[serde(default)]
    pub application_secret: Option<String>,
    #[serde(default)]
    pub owner_fk: Option<i64>,
    #[serde(default)]
    pub application_license_type_fk: Option<i64>,
    #[serde(default)]
    pub application_owner_name_translation_key: Option<String>,
    #[serde(default)]
    pub application_license_type_name_translation_key: Option<String>,
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_update_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
}
