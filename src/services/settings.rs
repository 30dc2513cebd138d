//! Settings service
//!
//! Site settings are rows of `system_settings`. Admins edit them through the
//! generic CRUD routes; the public site only ever sees rows marked
//! `is_public`, flattened into a key/value map.

use super::content::{ContentError, ContentService};
use crate::db::repositories::ListQuery;
use crate::models::SystemSetting;
use serde_json::{Map, Value};

#[derive(Clone)]
pub struct SettingsService {
    settings: ContentService<SystemSetting>,
}

impl SettingsService {
    pub fn new(settings: ContentService<SystemSetting>) -> Self {
        Self { settings }
    }

    /// `{setting_key: setting_value}` for every public setting
    pub async fn public_settings(&self) -> Result<Map<String, Value>, ContentError> {
        let rows = self.settings.list_public(&ListQuery::default()).await?;
        Ok(rows
            .into_iter()
            .map(|s| (s.setting_key, s.setting_value))
            .collect())
    }

    /// Value of one setting, public or not
    pub async fn get(&self, key: &str) -> Result<Option<Value>, ContentError> {
        Ok(self
            .settings
            .find_by("setting_key", key)
            .await?
            .map(|s| s.setting_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_test_cache;
    use crate::db::create_test_pool;
    use crate::db::migrations::run_migrations;
    use crate::db::repositories::SqlxTableRepository;
    use crate::models::settings::{CreateSettingInput, UpdateSettingInput};
    use serde_json::json;

    #[tokio::test]
    async fn test_only_public_settings_are_exposed() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let content: ContentService<SystemSetting> =
            ContentService::new(SqlxTableRepository::boxed(pool), create_test_cache());
        let svc = SettingsService::new(content.clone());

        content
            .create(CreateSettingInput {
                setting_key: "site_name".into(),
                setting_value: json!("Marwar Agro"),
                is_public: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        let secret = content
            .create(CreateSettingInput {
                setting_key: "export_margin".into(),
                setting_value: json!({"percent": 12}),
                is_public: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();

        let public = svc.public_settings().await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public["site_name"], "Marwar Agro");
        assert_eq!(
            svc.get("export_margin").await.unwrap(),
            Some(json!({"percent": 12}))
        );
        assert!(svc.get("missing").await.unwrap().is_none());

        content
            .update(
                &secret.id,
                UpdateSettingInput {
                    is_public: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let public = svc.public_settings().await.unwrap();
        assert_eq!(public.len(), 2);
    }
}
