//! Per-site settings groups.
//!
//! Each group is edited as a unit by the administration service and
//! persisted as a single flexible object on the site record.

use serde::{Deserialize, Serialize};

/// Public company details shown in site footers and contact pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyInfo {
    pub name: Option<String>,
    pub street_address: Option<String>,
    pub street_address2: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    /// ISO 3166 country code.
    pub country: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub public_email: Option<String>,
    pub website: Option<String>,
}

/// Outbound SMTP credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    pub default_from_address: Option<String>,
    pub default_from_alias: Option<String>,
    pub smtp_server: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_use_ssl: bool,
    pub smtp_requires_auth: bool,
    pub smtp_preferred_encoding: Option<String>,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            default_from_address: None,
            default_from_alias: None,
            smtp_server: None,
            smtp_port: 25,
            smtp_user: None,
            smtp_password: None,
            smtp_use_ssl: false,
            smtp_requires_auth: false,
            smtp_preferred_encoding: None,
        }
    }
}

impl MailSettings {
    /// Whether the site can send email notifications.
    pub fn is_configured(&self) -> bool {
        let has_server = is_set(&self.smtp_server) && is_set(&self.default_from_address);
        if !self.smtp_requires_auth {
            return has_server;
        }
        has_server && is_set(&self.smtp_user) && is_set(&self.smtp_password)
    }
}

/// SMS gateway credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsSettings {
    pub client_id: Option<String>,
    pub secure_token: Option<String>,
    pub from_number: Option<String>,
}

impl SmsSettings {
    pub fn is_configured(&self) -> bool {
        is_set(&self.client_id) && is_set(&self.secure_token) && is_set(&self.from_number)
    }
}

/// Account and login policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    pub allow_new_registration: bool,
    pub allow_persistent_login: bool,
    pub disable_db_auth: bool,
    pub really_delete_users: bool,
    pub require_approval_before_login: bool,
    pub require_confirmed_email: bool,
    pub require_confirmed_phone: bool,
    pub use_email_for_login: bool,
    /// Comma separated addresses notified when an account awaits approval.
    pub account_approval_email_csv: Option<String>,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            allow_new_registration: true,
            allow_persistent_login: true,
            disable_db_auth: false,
            really_delete_users: true,
            require_approval_before_login: false,
            require_confirmed_email: false,
            require_confirmed_phone: false,
            use_email_for_login: true,
            account_approval_email_csv: None,
        }
    }
}

/// reCAPTCHA keys and where the challenge is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaSettings {
    pub recaptcha_public_key: Option<String>,
    pub recaptcha_private_key: Option<String>,
    pub use_invisible_recaptcha: bool,
    pub captcha_on_registration: bool,
    pub captcha_on_login: bool,
}

/// External identity provider credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLoginSettings {
    pub facebook_app_id: Option<String>,
    pub facebook_app_secret: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub microsoft_client_id: Option<String>,
    pub microsoft_client_secret: Option<String>,
    pub twitter_consumer_key: Option<String>,
    pub twitter_consumer_secret: Option<String>,
    pub oidc_display_name: Option<String>,
    pub oidc_app_id: Option<String>,
    pub oidc_app_secret: Option<String>,
    pub oidc_authority: Option<String>,
}

impl SocialLoginSettings {
    /// True when at least one provider has both halves of its credentials.
    pub fn any_enabled(&self) -> bool {
        (is_set(&self.facebook_app_id) && is_set(&self.facebook_app_secret))
            || (is_set(&self.google_client_id) && is_set(&self.google_client_secret))
            || (is_set(&self.microsoft_client_id) && is_set(&self.microsoft_client_secret))
            || (is_set(&self.twitter_consumer_key) && is_set(&self.twitter_consumer_secret))
            || (is_set(&self.oidc_app_id)
                && is_set(&self.oidc_app_secret)
                && is_set(&self.oidc_authority))
    }
}

/// Markup shown above and below the login form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginPageContent {
    pub info_top: Option<String>,
    pub info_bottom: Option<String>,
}

/// Markup shown on the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationPageContent {
    pub preamble: Option<String>,
    pub agreement: Option<String>,
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mail_requires_credentials_only_with_auth() {
        let mut mail = MailSettings {
            smtp_server: Some("smtp.example.com".into()),
            default_from_address: Some("noreply@example.com".into()),
            ..Default::default()
        };
        assert!(mail.is_configured());

        mail.smtp_requires_auth = true;
        assert!(!mail.is_configured());

        mail.smtp_user = Some("mailer".into());
        mail.smtp_password = Some("secret".into());
        assert!(mail.is_configured());
    }

    #[test]
    fn blank_values_do_not_count() {
        let sms = SmsSettings {
            client_id: Some("id".into()),
            secure_token: Some("   ".into()),
            from_number: Some("+15550100".into()),
        };
        assert!(!sms.is_configured());
    }

    #[test]
    fn social_needs_both_halves() {
        let mut social = SocialLoginSettings {
            google_client_id: Some("client".into()),
            ..Default::default()
        };
        assert!(!social.any_enabled());

        social.google_client_secret = Some("secret".into());
        assert!(social.any_enabled());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let security: SecuritySettings =
            serde_json::from_value(serde_json::json!({ "disable_db_auth": true })).unwrap();
        assert!(security.disable_db_auth);
        assert!(security.allow_new_registration);
        assert!(security.use_email_for_login);
    }
}
