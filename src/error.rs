use std::{io, path::PathBuf};
use thiserror::Error;

/// Tipo de retorno conveniente para todo o projeto
pub type SefazResult<T> = Result<T, SefazError>;

#[derive(Error, Debug)]
pub enum SefazError {
    #[error(
        "Nenhuma aba SEFAZ reconhecida encontrada!\n\
        Arquivo: {arquivo:?}\n\
        Abas esperadas: {esperadas}"
    )]
    NenhumaAbaReconhecida { arquivo: PathBuf, esperadas: String },

    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error(
        "Faltou a variável de ambiente {nome}.\n\
        Defina-a no ambiente ou no arquivo .env do diretório atual."
    )]
    VariavelAusente { nome: &'static str },

    #[error("Variável de ambiente {nome} contém JSON inválido: {source}")]
    VariavelInvalida {
        nome: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("BASE <{base}> não configurada. Bases disponíveis: {disponiveis}")]
    BaseDesconhecida { base: String, disponiveis: String },

    #[error("Selecione a BASE (cliente) com --base. Bases disponíveis: {disponiveis}")]
    BaseNaoSelecionada { disponiveis: String },

    #[error("CGF <{0}> não encontrado nos dados carregados")]
    CgfNaoEncontrado(String),

    #[error("Aba <{aba}> contém colunas repetidas após normalização: <{coluna}>")]
    DuplicateColumnName { aba: String, coluna: String },

    #[error("Erro no processamento CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Erro de I/O: {0}")]
    Io(#[from] io::Error),

    #[error(
        "Arquivo Excel não pôde ser lido!\n\
        Arquivo: {arquivo:?}\n\
        {source}"
    )]
    ExcelReader {
        #[source]
        source: calamine::Error,
        arquivo: PathBuf,
    },

    #[error("Falha ao ler a aba <{aba}>: {source}")]
    ExcelAba {
        #[source]
        source: calamine::Error,
        aba: String,
    },

    #[error("Credencial da conta de serviço inválida: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Erro HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google Sheets respondeu {status} em {operacao}:\n{corpo}")]
    ApiGoogle {
        operacao: String,
        status: u16,
        corpo: String,
    },

    #[error("Falha ao publicar a aba <{aba}>: {source}")]
    Publicacao {
        aba: String,
        #[source]
        source: Box<SefazError>,
    },

    #[error("{0} ação(ões) terminaram com erro")]
    AcoesComFalha(usize),
}

impl SefazError {
    /// Anexa o nome da aba de destino a uma falha de publicação.
    pub fn na_aba(self, aba: &str) -> Self {
        SefazError::Publicacao {
            aba: aba.to_string(),
            source: Box::new(self),
        }
    }
}
