//! Interface de linha de comando do Revena baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (analyze, author, kits,
//! demo) e flags globais (--config, --time-scale, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Revena: auditoria de itens de faturamento médico extraídos por IA.
#[derive(Debug, Parser)]
#[command(name = "revena", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho para o arquivo de configuração (padrão: ./revena.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Multiplicador das latências simuladas (0 = instantâneo).
    #[arg(long, global = true)]
    pub time_scale: Option<f64>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Envia documentos para análise e acompanha o pipeline.
    Analyze {
        /// Nomes dos documentos enviados.
        #[arg(required = true)]
        files: Vec<String>,

        /// Grava o relatório XML do primeiro documento neste caminho.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Cria um documento de teste a partir de dados digitados.
    Author {
        #[arg(long)]
        patient: String,

        #[arg(long)]
        procedure: String,

        #[arg(long)]
        description: String,

        /// Grava o relatório XML neste caminho.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Lista os kits de referência.
    Kits {
        /// Imprime os kits como JSON.
        #[arg(long)]
        json: bool,
    },

    /// Executa uma sessão de revisão completa de demonstração.
    Demo {
        /// Kit adicionado durante a revisão.
        #[arg(long, default_value = "Laparoscopy Kit")]
        kit: String,
    },
}
