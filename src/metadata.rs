use std::fmt;

use crate::RE_MULTISPACE;

// --- Nomes de colunas ---

pub const COL_CGF: &str = "CGF";
pub const COL_TIPO_PENDENCIA: &str = "TIPO_PENDENCIA";
pub const COL_PRIORIDADE: &str = "PRIORIDADE";

/// Colunas operacionais e seus valores padrão (aplicados somente
/// quando a coluna não existe em nenhuma aba do lote).
pub const COLUNAS_OPERACIONAIS: [(&str, &str); 5] = [
    ("STATUS", "PENDENTE"),
    ("RESPONSAVEL", ""),
    ("PRAZO", ""),
    ("EVIDENCIA_LINK", ""),
    ("OBS", ""),
];

// --- Abas de destino no Google Sheets ---

pub const ABA_DETALHE: &str = "PENDENCIAS_DETALHE";
pub const ABA_RESUMO: &str = "RESUMO_POR_CGF";
pub const ABA_FILA: &str = "FILA_TRABALHO";

// --- Tabelas de Referência ---

/// Categoria da pendência, determinada pela aba de origem do Excel SEFAZ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TipoPendencia {
    OmissaoEfd,
    NfeOmissaoDivergencia,
    NfeInexistenteDeclarada,
    CfeOmissaoDivergencia,
    NfeSemRegPas,
}

impl TipoPendencia {
    pub fn as_str(self) -> &'static str {
        match self {
            TipoPendencia::OmissaoEfd => "OMISSAO_EFD",
            TipoPendencia::NfeOmissaoDivergencia => "NFE_OMISSAO_DIVERGENCIA",
            TipoPendencia::NfeInexistenteDeclarada => "NFE_INEXISTENTE_DECLARADA",
            TipoPendencia::CfeOmissaoDivergencia => "CFE_OMISSAO_DIVERGENCIA",
            TipoPendencia::NfeSemRegPas => "NFE_SEM_REG_PAS",
        }
    }
}

impl fmt::Display for TipoPendencia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapa ABA -> TIPO_PENDENCIA.
/// A ordem deste array define a ordem de concatenação das linhas.
pub const MAPA_ABAS: [(&str, TipoPendencia); 5] = [
    ("Omissões de EFD", TipoPendencia::OmissaoEfd),
    (
        "Omissões e divergências de NFE",
        TipoPendencia::NfeOmissaoDivergencia,
    ),
    (
        "NFe inexistente declarada",
        TipoPendencia::NfeInexistenteDeclarada,
    ),
    (
        "Omissões e Divergências CFe",
        TipoPendencia::CfeOmissaoDivergencia,
    ),
    ("NFe sem REG_PAS", TipoPendencia::NfeSemRegPas),
];

/// Chave de comparação de nomes de abas: trim, minúsculas e espaços colapsados.
pub fn chave_da_aba(nome: &str) -> String {
    RE_MULTISPACE
        .replace_all(nome.trim(), " ")
        .to_lowercase()
}

/// Procura a categoria correspondente ao nome de uma aba do Excel.
///
/// ```
/// use pendencias_sefaz::{TipoPendencia, tipo_da_aba};
///
/// assert_eq!(tipo_da_aba("  omissões   de EFD "), Some(TipoPendencia::OmissaoEfd));
/// assert_eq!(tipo_da_aba("Planilha1"), None);
/// ```
pub fn tipo_da_aba(nome: &str) -> Option<TipoPendencia> {
    let chave = chave_da_aba(nome);
    MAPA_ABAS
        .iter()
        .find(|(aba, _)| chave_da_aba(aba) == chave)
        .map(|&(_, tipo)| tipo)
}

/// Prioridade de tratamento de uma pendência.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prioridade {
    Critico,
    Alto,
    Medio,
}

impl Prioridade {
    pub fn as_str(self) -> &'static str {
        match self {
            Prioridade::Critico => "CRÍTICO",
            Prioridade::Alto => "ALTO",
            Prioridade::Medio => "MÉDIO",
        }
    }

    /// Regra de classificação: qualquer valor fora da tabela é MÉDIO.
    pub fn do_tipo(tipo_pendencia: &str) -> Self {
        match tipo_pendencia {
            "OMISSAO_EFD" => Prioridade::Critico,
            "NFE_INEXISTENTE_DECLARADA" | "NFE_SEM_REG_PAS" => Prioridade::Alto,
            _ => Prioridade::Medio,
        }
    }
}

impl fmt::Display for Prioridade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todas_as_abas_do_mapa_sao_reconhecidas() {
        for (aba, tipo) in MAPA_ABAS {
            assert_eq!(tipo_da_aba(aba), Some(tipo));
            assert_eq!(tipo_da_aba(&aba.to_uppercase()), Some(tipo));
        }
    }

    #[test]
    fn prioridade_segue_a_tabela_de_tipos() {
        assert_eq!(Prioridade::do_tipo("OMISSAO_EFD"), Prioridade::Critico);
        assert_eq!(
            Prioridade::do_tipo("NFE_INEXISTENTE_DECLARADA"),
            Prioridade::Alto
        );
        assert_eq!(Prioridade::do_tipo("NFE_SEM_REG_PAS"), Prioridade::Alto);
        assert_eq!(
            Prioridade::do_tipo("NFE_OMISSAO_DIVERGENCIA"),
            Prioridade::Medio
        );
        assert_eq!(
            Prioridade::do_tipo("CFE_OMISSAO_DIVERGENCIA"),
            Prioridade::Medio
        );
        assert_eq!(Prioridade::do_tipo(""), Prioridade::Medio);
    }
}
