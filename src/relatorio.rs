use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
    process::Command,
};

use crate::{
    ABA_DETALHE, ABA_FILA, ABA_RESUMO, ResumoCgf, SefazResult, Tabela, contar_por_prioridade,
    contar_por_tipo, resumir_por_cgf,
};

/// Largura máxima da barra no gráfico de pendências por tipo.
const LARGURA_BARRA: usize = 50;

/// Limpar a tela.
pub fn clear_screen(clear_screen: bool) -> SefazResult<()> {
    if clear_screen {
        if cfg!(target_os = "windows") {
            // No Windows, 'cls' é um comando interno do 'cmd'.
            Command::new("cmd").args(["/c", "cls"]).status()?;
        } else {
            Command::new("clear").status()?;
        }
    }

    Ok(())
}

/// Exibe a descrição e a versão do programa.
pub fn imprimir_versao_do_programa() {
    let descr = [
        "Este programa lê o Excel bruto de pendências da SEFAZ e classifica cada pendência por prioridade.",
        "Omissões de EFD são CRÍTICAS; NFe inexistente declarada e NFe sem REG_PAS são de prioridade ALTA.",
        "As demais pendências são de prioridade MÉDIA.",
        "O resultado pode ser detalhado por CGF, exportado em CSV ou publicado no Google Sheets da BASE (cliente).",
    ];

    println!("\n {}\n", descr.join("\n "));
    println!(
        " {} versão {}\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
}

pub fn fmt_milhares(n: usize) -> String {
    let s = n.to_string();
    let len = s.len();
    let mut result = String::with_capacity(len + len / 3);

    s.chars().enumerate().for_each(|(i, c)| {
        if i > 0 && (len - i).is_multiple_of(3) {
            result.push('.');
        }
        result.push(c);
    });

    result
}

/// Barras horizontais proporcionais ao maior valor.
///
/// ```
/// use pendencias_sefaz::grafico_de_barras;
///
/// let linhas = grafico_de_barras(&[("A".to_string(), 4), ("BB".to_string(), 2)], 4);
/// assert_eq!(linhas, vec!["A  | ████ 4", "BB | ██ 2"]);
/// ```
pub fn grafico_de_barras(dados: &[(String, usize)], largura: usize) -> Vec<String> {
    let max_rotulo = dados
        .iter()
        .map(|(rotulo, _)| rotulo.chars().count())
        .max()
        .unwrap_or_default();
    let max_valor = dados.iter().map(|(_, n)| *n).max().unwrap_or_default();

    dados
        .iter()
        .map(|(rotulo, n)| {
            let barra = if max_valor == 0 {
                0
            } else {
                (n * largura).div_ceil(max_valor)
            };
            format!(
                "{rotulo:<max_rotulo$} | {} {}",
                "█".repeat(barra),
                fmt_milhares(*n)
            )
        })
        .collect()
}

/// Painel geral: métricas por prioridade e pendências por tipo.
pub fn imprimir_dashboard(det: &Tabela) {
    let contagem = contar_por_prioridade(det);

    println!(" --- Dashboard Geral ---\n");
    println!(" CRÍTICOS : {:>9}", fmt_milhares(contagem.critico));
    println!(" ALTOS    : {:>9}", fmt_milhares(contagem.alto));
    println!(" MÉDIOS   : {:>9}", fmt_milhares(contagem.medio));
    println!(" TOTAL    : {:>9}", fmt_milhares(contagem.total));

    println!("\n --- Pendências por Tipo ---\n");
    for linha in grafico_de_barras(&contar_por_tipo(det), LARGURA_BARRA) {
        println!(" {linha}");
    }
    println!();
}

/// Formata uma tabela com colunas alinhadas pela maior célula.
pub fn formatar_tabela(tabela: &Tabela) -> Vec<String> {
    let larguras: Vec<usize> = tabela
        .colunas
        .iter()
        .enumerate()
        .map(|(i, coluna)| {
            tabela
                .linhas
                .iter()
                .filter_map(|linha| linha.get(i))
                .map(|v| v.chars().count())
                .chain(std::iter::once(coluna.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let formatar = |celulas: &[String]| -> String {
        celulas
            .iter()
            .zip(&larguras)
            .map(|(valor, &largura)| format!("{valor:<largura$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    std::iter::once(formatar(tabela.colunas.as_slice()))
        .chain(tabela.linhas.iter().map(|linha| formatar(linha.as_slice())))
        .collect()
}

/// Detalhamento das pendências de um único CGF.
pub fn imprimir_detalhe(cgf: &str, tabela: &Tabela) {
    println!(
        " --- Detalhamento do CGF {cgf}: {} pendência(s) ---\n",
        fmt_milhares(tabela.len())
    );
    for linha in formatar_tabela(tabela) {
        println!(" {linha}");
    }
    println!();
}

pub fn imprimir_cgfs(cgfs: &[String]) {
    println!(" CGFs encontrados ({}):\n", fmt_milhares(cgfs.len()));
    for (i, cgf) in cgfs.iter().enumerate() {
        let cgf = if cgf.is_empty() { "(sem CGF)" } else { cgf.as_str() };
        println!("{:6}: {}", i + 1, cgf);
    }
    println!();
}

fn gravar_csv(path: &Path, tabela: &Tabela) -> SefazResult<()> {
    let file = fs::File::create(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(BufWriter::new(file));

    wtr.write_record(&tabela.colunas)?;
    for linha in &tabela.linhas {
        wtr.write_record(linha)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Grava detalhe, resumo por CGF e fila de trabalho em `dir`, um CSV por aba.
pub fn exportar_csv(dir: &Path, det: &Tabela) -> SefazResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let resumo = ResumoCgf::para_tabela(&resumir_por_cgf(det));

    [(ABA_DETALHE, det), (ABA_RESUMO, &resumo), (ABA_FILA, det)]
        .into_iter()
        .map(|(aba, tabela)| -> SefazResult<PathBuf> {
            let path = dir.join(format!("{aba}.csv"));
            println!(" ---> Novo arquivo: <{}>", path.display());
            gravar_csv(&path, tabela)?;
            Ok(path)
        })
        .collect()
}
