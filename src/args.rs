use clap::Parser;
use std::{collections::BTreeMap, env, path::PathBuf};

use crate::{ContaDeServico, RE_ID_PLANILHA, RE_URL_PLANILHA, SefazError, SefazResult};

/// Variável de ambiente com o mapa BASE (cliente) -> ID da planilha Google.
pub const ENV_BASES: &str = "BASE_TO_SHEET_JSON";

/// Variável de ambiente com a chave JSON da conta de serviço Google.
pub const ENV_CONTA_DE_SERVICO: &str = "GOOGLE_SERVICE_ACCOUNT_JSON";

// Estrutura para o Clap processar os argumentos da linha de comando
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Arguments {
    /// Excel bruto da SEFAZ (.xlsx).
    ///
    /// Abas reconhecidas:
    ///
    /// - `Omissões de EFD`
    /// - `Omissões e divergências de NFE`
    /// - `NFe inexistente declarada`
    /// - `Omissões e Divergências CFe`
    /// - `NFe sem REG_PAS`
    #[arg(short, long, required = true)]
    arquivo: Option<PathBuf>,

    /// BASE (cliente) de destino da publicação
    #[arg(short, long)]
    base: Option<String>,

    /// Detalhar as pendências de um CGF
    #[arg(long)]
    cgf: Option<String>,

    /// Clear screen
    #[arg(short, long, default_value_t = false)]
    clear: bool,

    /// Exportar detalhe, resumo e fila de trabalho em CSV para este diretório
    #[arg(short, long)]
    exportar: Option<PathBuf>,

    /// Listar as BASES configuradas em BASE_TO_SHEET_JSON
    #[arg(long, default_value_t = false)]
    listar_bases: bool,

    /// Listar os CGFs encontrados
    #[arg(long, default_value_t = false)]
    listar_cgfs: bool,

    /// Atualizar o Google Sheets da BASE selecionada
    #[arg(short, long, default_value_t = false)]
    publicar: bool,

    /// Ativar modo detalhado (verbose)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Debug)]
pub struct Config {
    pub arquivo: PathBuf,
    pub base: Option<String>,
    pub cgf: Option<String>,
    pub clear: bool,
    pub exportar: Option<PathBuf>,
    pub listar_bases: bool,
    pub listar_cgfs: bool,
    pub publicar: bool,
    pub verbose: bool,
}

pub fn get_config() -> SefazResult<Config> {
    let args = Arguments::parse();

    // Como o Clap já exige 'required = true', este erro só ocorreria em casos extremos.
    let arquivo = args
        .arquivo
        .ok_or_else(|| SefazError::Config("Arquivo Excel não informado".into()))?;

    Ok(Config {
        arquivo,
        base: args.base,
        cgf: args.cgf,
        clear: args.clear,
        exportar: args.exportar,
        listar_bases: args.listar_bases,
        listar_cgfs: args.listar_cgfs,
        publicar: args.publicar,
        verbose: args.verbose,
    })
}

/// Configuração de publicação, lida do ambiente somente quando necessária.
#[derive(Debug)]
pub struct ConfigPublicacao {
    /// BASE -> ID da planilha (ordenado pelo nome da BASE)
    pub bases: BTreeMap<String, String>,
}

impl ConfigPublicacao {
    pub fn from_env() -> SefazResult<Self> {
        let raw = ler_variavel(ENV_BASES)?;
        Self::from_json(&raw)
    }

    /// Interpreta o JSON `{"BASE": "id ou URL da planilha"}`.
    pub fn from_json(raw: &str) -> SefazResult<Self> {
        let bases: BTreeMap<String, String> =
            serde_json::from_str(raw).map_err(|source| SefazError::VariavelInvalida {
                nome: ENV_BASES,
                source,
            })?;

        if bases.is_empty() {
            return Err(SefazError::Config(format!(
                "{ENV_BASES} não contém nenhuma BASE"
            )));
        }

        let bases = bases
            .into_iter()
            .map(|(base, valor)| -> SefazResult<(String, String)> {
                let id = extrair_id_planilha(&valor).ok_or_else(|| {
                    SefazError::Config(format!(
                        "BASE <{base}>: <{valor}> não é um ID nem uma URL de planilha"
                    ))
                })?;
                Ok((base, id))
            })
            .collect::<SefazResult<BTreeMap<_, _>>>()?;

        Ok(ConfigPublicacao { bases })
    }

    pub fn disponiveis(&self) -> String {
        self.bases.keys().cloned().collect::<Vec<_>>().join(", ")
    }

    /// ID da planilha da BASE escolhida.
    pub fn id_planilha(&self, base: Option<&str>) -> SefazResult<&str> {
        let base = base.ok_or_else(|| SefazError::BaseNaoSelecionada {
            disponiveis: self.disponiveis(),
        })?;

        self.bases
            .get(base)
            .map(String::as_str)
            .ok_or_else(|| SefazError::BaseDesconhecida {
                base: base.to_string(),
                disponiveis: self.disponiveis(),
            })
    }
}

/// Lê e interpreta a conta de serviço Google do ambiente.
pub fn conta_de_servico_from_env() -> SefazResult<ContaDeServico> {
    let raw = ler_variavel(ENV_CONTA_DE_SERVICO)?;
    serde_json::from_str(&raw).map_err(|source| SefazError::VariavelInvalida {
        nome: ENV_CONTA_DE_SERVICO,
        source,
    })
}

fn ler_variavel(nome: &'static str) -> SefazResult<String> {
    env::var(nome)
        .ok()
        .filter(|valor| !valor.trim().is_empty())
        .ok_or(SefazError::VariavelAusente { nome })
}

/// Aceita tanto o ID puro quanto a URL completa da planilha.
///
/// ```
/// use pendencias_sefaz::extrair_id_planilha;
///
/// let url = "https://docs.google.com/spreadsheets/d/1AbC-xyz_123/edit#gid=0";
/// assert_eq!(extrair_id_planilha(url), Some("1AbC-xyz_123".to_string()));
/// assert_eq!(extrair_id_planilha(" 1AbC-xyz_123 "), Some("1AbC-xyz_123".to_string()));
/// assert_eq!(extrair_id_planilha("não é id"), None);
/// ```
pub fn extrair_id_planilha(valor: &str) -> Option<String> {
    let valor = valor.trim();

    if let Some(caps) = RE_URL_PLANILHA.captures(valor) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }

    RE_ID_PLANILHA
        .is_match(valor)
        .then(|| valor.to_string())
}
