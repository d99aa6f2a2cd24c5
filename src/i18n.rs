// src/i18n.rs

use std::{collections::HashMap, sync::Arc};

use anyhow::Context;

pub const DEFAULT_LANGUAGE: &str = "en";

// Tabelas embutidas no binário
const TABLES: [(&str, &str); 2] = [
    ("en", include_str!("../locales/en.json")),
    ("ar", include_str!("../locales/ar.json")),
];

/// Resolve chaves semânticas em textos para o idioma pedido.
#[derive(Debug, Clone)]
pub struct I18nStore {
    tables: Arc<HashMap<String, HashMap<String, String>>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut tables = HashMap::new();
        for (lang, raw) in TABLES {
            let table: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("Tabela de tradução '{}' inválida", lang))?;
            tables.insert(lang.to_string(), table);
        }

        tracing::info!("🌐 {} idiomas carregados", tables.len());
        Ok(Self {
            tables: Arc::new(tables),
        })
    }

    /// Procura no idioma pedido, depois em inglês; sem tradução devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str, params: &[(&str, &str)]) -> String {
        let template = self
            .lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANGUAGE, key))
            .unwrap_or(key);

        params
            .iter()
            .fold(template.to_string(), |text, (name, value)| {
                text.replace(&format!("{{{}}}", name), value)
            })
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.tables
            .get(lang)
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_share_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let en = &store.tables["en"];
        let ar = &store.tables["ar"];

        let mut missing: Vec<_> = en.keys().filter(|k| !ar.contains_key(*k)).collect();
        missing.sort();
        assert!(missing.is_empty(), "faltam em ar: {:?}", missing);
        assert_eq!(en.len(), ar.len());
    }

    #[test]
    fn falls_back_to_english_then_to_key() {
        let store = I18nStore::load().unwrap();

        assert_eq!(
            store.translate("fr", "validationDistrictRequired", &[]),
            "District is required"
        );
        assert_eq!(store.translate("ar", "noSuchKey", &[]), "noSuchKey");
    }

    #[test]
    fn interpolates_params() {
        let store = I18nStore::load().unwrap();
        let text = store.translate("en", "errorUnknownField", &[("path", "nickname")]);
        assert!(text.contains("nickname"));
    }
}
