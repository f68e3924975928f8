use calamine::{Data, Reader, open_workbook_auto};
use std::path::Path;

use crate::{AbaBruta, SefazError, SefazResult};

/// Converte uma célula para texto, como se toda a planilha fosse lida com `dtype=str`.
///
/// Números inteiros armazenados como ponto flutuante perdem o `.0`;
/// datas são formatadas como `AAAA-MM-DD HH:MM:SS`.
pub fn celula_para_texto(celula: &Data) -> String {
    match celula {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

fn linha_em_branco(linha: &[String]) -> bool {
    linha.iter().all(|v| v.trim().is_empty())
}

/// Lê todas as abas de um arquivo Excel (xlsx, xls, xlsb, ods).
///
/// A primeira linha de cada aba é o cabeçalho; linhas em branco são descartadas.
pub fn ler_abas_excel(arquivo: &Path) -> SefazResult<Vec<AbaBruta>> {
    let mut workbook = open_workbook_auto(arquivo).map_err(|e| SefazError::ExcelReader {
        source: e,
        arquivo: arquivo.to_path_buf(),
    })?;

    let nomes = workbook.sheet_names();
    let mut abas = Vec::with_capacity(nomes.len());

    for nome in nomes {
        let range = workbook
            .worksheet_range(&nome)
            .map_err(|e| SefazError::ExcelAba {
                source: e,
                aba: nome.clone(),
            })?;

        let mut linhas = range
            .rows()
            .map(|row| row.iter().map(celula_para_texto).collect::<Vec<String>>());

        let cabecalho = linhas.next().unwrap_or_default();
        let linhas: Vec<Vec<String>> = linhas.filter(|l| !linha_em_branco(l)).collect();

        log::debug!(
            "Aba <{}>: {} coluna(s), {} linha(s)",
            nome,
            cabecalho.len(),
            linhas.len()
        );

        abas.push(AbaBruta {
            nome,
            cabecalho,
            linhas,
        });
    }

    Ok(abas)
}
