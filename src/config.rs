//! Configuração do motor de auditoria carregada a partir de `revena.toml`.
//!
//! A struct [`EngineConfig`] contém as latências simuladas do pipeline, a faixa
//! de preços dos kits e a capacidade do canal de eventos. Valores ausentes no
//! arquivo usam defaults. A variável de ambiente `REVENA_TIME_SCALE` tem
//! precedência sobre o arquivo.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::RevenaError;
use crate::items::RandomPricing;
use crate::provider::SimulatedProvider;
use crate::state_machine::StageTimings;

/// Arquivo procurado no diretório atual quando `--config` não é informado.
pub const DEFAULT_CONFIG_FILE: &str = "revena.toml";

/// Variável de ambiente que sobrescreve `time_scale`.
pub const TIME_SCALE_ENV: &str = "REVENA_TIME_SCALE";

/// Configuração de nível superior carregada de `revena.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Atraso entre a criação do job e o início do pipeline.
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,

    /// Latências antes das etapas de estrutura, extração e validação.
    #[serde(default = "default_stage_delays_ms")]
    pub stage_delays_ms: [u64; 3],

    /// Latência mínima e máxima do provedor de análise.
    #[serde(default = "default_provider_latency_ms")]
    pub provider_latency_ms: [u64; 2],

    /// Faixa `[min, max)` de preços sorteados para itens de kit.
    #[serde(default = "default_kit_price_range")]
    pub kit_price_range: [u32; 2],

    /// Capacidade do canal de notificações do store.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Multiplicador aplicado a todas as latências (0 = instantâneo).
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
}

// Valor padrão do atraso inicial: 500ms.
fn default_start_delay_ms() -> u64 {
    500
}

fn default_stage_delays_ms() -> [u64; 3] {
    [1500, 2000, 1500]
}

fn default_provider_latency_ms() -> [u64; 2] {
    [2000, 4000]
}

fn default_kit_price_range() -> [u32; 2] {
    [10, 60]
}

fn default_event_capacity() -> usize {
    256
}

fn default_time_scale() -> f64 {
    1.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: default_start_delay_ms(),
            stage_delays_ms: default_stage_delays_ms(),
            provider_latency_ms: default_provider_latency_ms(),
            kit_price_range: default_kit_price_range(),
            event_capacity: default_event_capacity(),
            time_scale: default_time_scale(),
        }
    }
}

impl EngineConfig {
    /// Todas as latências zeradas. Útil em testes e demonstrações.
    pub fn instant() -> Self {
        Self {
            time_scale: 0.0,
            ..Self::default()
        }
    }

    /// Carrega a configuração de `path`, ou de `revena.toml` no diretório atual.
    /// Usa valores padrão se o arquivo padrão não existir; um caminho explícito
    /// inexistente é erro.
    pub fn load(path: Option<&Path>) -> Result<Self, RevenaError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_time_scale_override(std::env::var(TIME_SCALE_ENV).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, RevenaError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str::<EngineConfig>(&contents)?)
    }

    /// Variável de ambiente tem precedência sobre o arquivo de configuração.
    pub fn apply_time_scale_override(&mut self, value: Option<String>) -> Result<(), RevenaError> {
        let Some(raw) = value.filter(|v| !v.trim().is_empty()) else {
            return Ok(());
        };
        self.time_scale = raw
            .trim()
            .parse::<f64>()
            .map_err(|e| RevenaError::Config(format!("{TIME_SCALE_ENV}={raw}: {e}")))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), RevenaError> {
        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(RevenaError::Config(format!(
                "time_scale must be a non-negative number, got {}",
                self.time_scale
            )));
        }
        let [min, max] = self.provider_latency_ms;
        if min > max {
            return Err(RevenaError::Config(format!(
                "provider_latency_ms minimum {min} exceeds maximum {max}"
            )));
        }
        let [low, high] = self.kit_price_range;
        if low > high {
            return Err(RevenaError::Config(format!(
                "kit_price_range minimum {low} exceeds maximum {high}"
            )));
        }
        if self.event_capacity == 0 {
            return Err(RevenaError::Config("event_capacity must be at least 1".into()));
        }
        Ok(())
    }

    fn scaled(&self, millis: u64) -> Duration {
        Duration::from_millis(millis).mul_f64(self.time_scale)
    }

    pub fn start_delay(&self) -> Duration {
        self.scaled(self.start_delay_ms)
    }

    pub fn stage_timings(&self) -> StageTimings {
        let [structure, extraction, validation] = self.stage_delays_ms;
        StageTimings {
            document_structure: self.scaled(structure),
            entity_extraction: self.scaled(extraction),
            billing_validation: self.scaled(validation),
        }
    }

    pub fn provider(&self) -> SimulatedProvider {
        let [min, max] = self.provider_latency_ms;
        SimulatedProvider::new(self.scaled(min), self.scaled(max))
    }

    pub fn kit_pricing(&self) -> RandomPricing {
        let [min, max] = self.kit_price_range;
        RandomPricing { min, max }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config_values() {
        let config = EngineConfig::default();
        assert_eq!(config.start_delay_ms, 500);
        assert_eq!(config.stage_delays_ms, [1500, 2000, 1500]);
        assert_eq!(config.provider_latency_ms, [2000, 4000]);
        assert_eq!(config.kit_price_range, [10, 60]);
        assert_eq!(config.time_scale, 1.0);
        assert_eq!(config.start_delay(), Duration::from_millis(500));
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            start_delay_ms = 100
            kit_price_range = [20, 30]
        "#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.start_delay_ms, 100);
        assert_eq!(config.kit_price_range, [20, 30]);
        assert_eq!(config.stage_delays_ms, [1500, 2000, 1500]);
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn load_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "time_scale = 0.5").unwrap();
        writeln!(file, "stage_delays_ms = [1000, 1000, 1000]").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.time_scale, 0.5);
        assert_eq!(
            config.stage_timings().entity_extraction,
            Duration::from_millis(500)
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, RevenaError::Io(_)));
    }

    #[test]
    fn env_override_replaces_time_scale() {
        let mut config = EngineConfig::default();
        config.apply_time_scale_override(Some("0".into())).unwrap();
        assert_eq!(config.time_scale, 0.0);
        assert_eq!(config.start_delay(), Duration::ZERO);

        config.apply_time_scale_override(None).unwrap();
        assert_eq!(config.time_scale, 0.0);

        assert!(config.apply_time_scale_override(Some("fast".into())).is_err());
    }

    #[test]
    fn validate_rejects_inverted_ranges() {
        let config = EngineConfig {
            provider_latency_ms: [4000, 2000],
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            time_scale: -1.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn instant_config_zeroes_latencies() {
        let config = EngineConfig::instant();
        assert_eq!(config.start_delay(), Duration::ZERO);
        assert_eq!(config.stage_timings(), StageTimings::zero());
    }
}
