//! Site (tenant) domain model.
//!
//! A site is one logically isolated tenant of the platform. Requests are
//! routed to a site either by the first URL path segment (folder name) or
//! by the request host name, depending on the configured multi-tenant mode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::settings::{
    CaptchaSettings, CompanyInfo, LoginPageContent, MailSettings, RegistrationPageContent,
    SecuritySettings, SmsSettings, SocialLoginSettings,
};

/// A tenant site and all of its administrable settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: Uuid,
    /// Short machine-generated display alias (`s1`, `s2`, ...).
    pub alias_id: String,
    pub site_name: String,
    /// Lower-case URL folder segment; `None` only for the server admin
    /// site or when routing by host name.
    pub folder_name: Option<String>,
    /// One of this site's mapped host names, used when building links.
    pub preferred_host_name: Option<String>,
    /// The primary site: created at setup, never deletable, may administer
    /// every other site.
    pub is_server_admin_site: bool,
    pub time_zone_id: String,
    pub theme: Option<String>,
    pub is_closed: bool,
    pub closed_message: Option<String>,
    pub google_analytics_profile_id: Option<String>,
    pub add_this_profile_id: Option<String>,
    pub forced_culture: Option<String>,
    pub forced_ui_culture: Option<String>,
    pub company: CompanyInfo,
    pub mail: MailSettings,
    pub sms: SmsSettings,
    pub security: SecuritySettings,
    pub captcha: CaptchaSettings,
    pub social: SocialLoginSettings,
    pub login_page: LoginPageContent,
    pub registration_page: RegistrationPageContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new site.
///
/// The id is chosen by the caller so that identity checks can exclude
/// the site before it exists in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSite {
    pub id: Uuid,
    pub alias_id: String,
    pub site_name: String,
    pub folder_name: Option<String>,
    pub preferred_host_name: Option<String>,
    pub is_server_admin_site: bool,
    pub time_zone_id: String,
    pub is_closed: bool,
    pub closed_message: Option<String>,
}

/// Fields that can be updated on an existing site.
///
/// For nullable columns `Some(Some(v))` sets, `Some(None)` clears and
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSite {
    pub site_name: Option<String>,
    pub folder_name: Option<Option<String>>,
    pub preferred_host_name: Option<Option<String>>,
    pub time_zone_id: Option<String>,
    pub theme: Option<Option<String>>,
    pub is_closed: Option<bool>,
    pub closed_message: Option<Option<String>>,
    pub google_analytics_profile_id: Option<Option<String>>,
    pub add_this_profile_id: Option<Option<String>>,
    pub forced_culture: Option<Option<String>>,
    pub forced_ui_culture: Option<Option<String>>,
    pub company: Option<CompanyInfo>,
    pub mail: Option<MailSettings>,
    pub sms: Option<SmsSettings>,
    pub security: Option<SecuritySettings>,
    pub captcha: Option<CaptchaSettings>,
    pub social: Option<SocialLoginSettings>,
    pub login_page: Option<LoginPageContent>,
    pub registration_page: Option<RegistrationPageContent>,
}

impl UpdateSite {
    /// True when applying this update would not change anything.
    pub fn is_empty(&self) -> bool {
        self.site_name.is_none()
            && self.folder_name.is_none()
            && self.preferred_host_name.is_none()
            && self.time_zone_id.is_none()
            && self.theme.is_none()
            && self.is_closed.is_none()
            && self.closed_message.is_none()
            && self.google_analytics_profile_id.is_none()
            && self.add_this_profile_id.is_none()
            && self.forced_culture.is_none()
            && self.forced_ui_culture.is_none()
            && self.company.is_none()
            && self.mail.is_none()
            && self.sms.is_none()
            && self.security.is_none()
            && self.captcha.is_none()
            && self.social.is_none()
            && self.login_page.is_none()
            && self.registration_page.is_none()
    }
}
