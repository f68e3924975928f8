use regex::Regex;
use std::sync::LazyLock;

// Regex para normalização dos nomes das abas
pub static RE_MULTISPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Identificador de planilha Google a partir da URL completa.
///
/// Ex: `https://docs.google.com/spreadsheets/d/1AbC-xyz_123/edit#gid=0` -> `1AbC-xyz_123`
pub static RE_URL_PLANILHA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        /spreadsheets/d/ # Trecho fixo da URL
        ([A-Za-z0-9_-]+) # Identificador da planilha
        ",
    )
    .unwrap()
});

/// Identificador de planilha já isolado (sem URL).
pub static RE_ID_PLANILHA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());
