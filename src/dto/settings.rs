use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::{ContactInfo, SiteColors, SocialLinks};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub site_name: Option<String>,
    pub site_description: Option<String>,
    pub site_tagline: Option<String>,
    pub logo: Option<String>,
    /// "image" or "text".
    pub logo_type: Option<String>,
    pub font_family: Option<String>,
    pub site_colors: Option<SiteColors>,
    pub contact: Option<ContactInfo>,
    pub social_links: Option<SocialLinks>,
    pub about_us: Option<String>,
}
