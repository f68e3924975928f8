use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    path::Path,
};

use crate::{
    AbaBruta, COL_CGF, COL_PRIORIDADE, COL_TIPO_PENDENCIA, COLUNAS_OPERACIONAIS, MAPA_ABAS,
    Prioridade, SefazError, SefazResult, Tabela, chave_da_aba, tipo_da_aba,
};

/// Normaliza o nome de uma coluna: trim, maiúsculas e espaços trocados por `_`.
///
/// Colunas sem nome recebem `UNNAMED:_{posicao}`.
///
/// ```
/// use pendencias_sefaz::normalizar_coluna;
///
/// assert_eq!(normalizar_coluna("  Data de Emissão ", 0), "DATA_DE_EMISSÃO");
/// assert_eq!(normalizar_coluna("", 3), "UNNAMED:_3");
/// ```
pub fn normalizar_coluna(nome: &str, posicao: usize) -> String {
    let nome = nome.trim();
    if nome.is_empty() {
        return format!("UNNAMED:_{posicao}");
    }
    nome.to_uppercase().replace(' ', "_")
}

/// Renomeia cabeçalhos idênticos como o pandas: `Valor`, `Valor.1`, `Valor.2`...
///
/// Cabeçalhos em branco ficam intactos; cada um vira `UNNAMED:_{posicao}` depois.
fn desduplicar_cabecalho(cabecalho: &[String]) -> Vec<String> {
    let mut contagem: HashMap<String, usize> = HashMap::new();

    cabecalho
        .iter()
        .map(|nome| {
            if nome.trim().is_empty() {
                return nome.clone();
            }

            let mut nome = nome.clone();
            let mut atual = contagem.get(&nome).copied().unwrap_or_default();
            while atual > 0 {
                contagem.insert(nome.clone(), atual + 1);
                nome = format!("{nome}.{atual}");
                atual = contagem.get(&nome).copied().unwrap_or_default();
            }
            contagem.insert(nome.clone(), atual + 1);
            nome
        })
        .collect()
}

fn normalizar_aba(aba: &AbaBruta) -> SefazResult<Tabela> {
    let colunas: Vec<String> = desduplicar_cabecalho(&aba.cabecalho)
        .iter()
        .enumerate()
        .map(|(i, nome)| normalizar_coluna(nome, i))
        .collect();

    // Nomes distintos na origem que colidem após a normalização (`Nome X`, `NOME_X`).

    let mut vista = HashSet::with_capacity(colunas.len());
    if let Some(repetida) = colunas.iter().find(|c| !vista.insert(c.as_str())) {
        return Err(SefazError::DuplicateColumnName {
            aba: aba.nome.clone(),
            coluna: repetida.clone(),
        });
    }

    let largura = colunas.len();
    let linhas = aba
        .linhas
        .iter()
        .map(|linha| {
            let mut linha = linha.clone();
            linha.resize(largura, String::new());
            linha
        })
        .collect();

    Ok(Tabela { colunas, linhas })
}

/// Consome as abas reconhecidas do Excel SEFAZ e as concatena em uma única tabela.
///
/// As abas são percorridas na ordem de [`MAPA_ABAS`]; abas desconhecidas são ignoradas.
/// Cada aba reconhecida tem as colunas normalizadas, recebe `CGF` vazio se não
/// possuir essa coluna e tem `TIPO_PENDENCIA` carimbado conforme o nome da aba.
///
/// Se nenhuma aba for reconhecida, a tabela devolvida não tem colunas nem linhas.
pub fn ingerir(abas: &[AbaBruta]) -> SefazResult<Tabela> {
    let mut det = Tabela::default();

    for (nome, tipo) in MAPA_ABAS {
        let chave = chave_da_aba(nome);
        let Some(aba) = abas.iter().find(|aba| chave_da_aba(&aba.nome) == chave) else {
            continue;
        };

        let mut tabela = normalizar_aba(aba)?;
        tabela.garantir_coluna(COL_CGF, "");
        tabela.definir_coluna(COL_TIPO_PENDENCIA, tipo.as_str());

        log::info!(
            "Aba <{}> reconhecida como {}: {} linha(s)",
            aba.nome,
            tipo,
            tabela.len()
        );

        det.concatenar(tabela);
    }

    abas.iter()
        .filter(|aba| tipo_da_aba(&aba.nome).is_none())
        .for_each(|aba| log::debug!("Aba <{}> ignorada", aba.nome));

    Ok(det)
}

/// Define `PRIORIDADE` de todas as linhas a partir de `TIPO_PENDENCIA`.
pub fn aplicar_prioridade(det: &mut Tabela) {
    let idx_prioridade = det.garantir_coluna(COL_PRIORIDADE, Prioridade::Medio.as_str());
    let idx_tipo = det.indice(COL_TIPO_PENDENCIA);

    for linha in &mut det.linhas {
        let tipo = idx_tipo
            .and_then(|i| linha.get(i))
            .map(String::as_str)
            .unwrap_or_default();
        linha[idx_prioridade] = Prioridade::do_tipo(tipo).as_str().to_string();
    }
}

/// Acrescenta as colunas operacionais ausentes do esquema do lote.
///
/// O padrão é de esquema, não de linha: se qualquer aba já trouxe `STATUS`,
/// nenhuma linha recebe "PENDENTE".
pub fn preencher_colunas_operacionais(det: &mut Tabela) {
    for (coluna, padrao) in COLUNAS_OPERACIONAIS {
        det.garantir_coluna(coluna, padrao);
    }
}

/// Ingestão completa: abas -> tabela classificada e com colunas operacionais.
pub fn processar(arquivo: &Path, abas: &[AbaBruta]) -> SefazResult<Tabela> {
    let mut det = ingerir(abas)?;

    // Uma aba reconhecida sempre contribui ao menos com CGF e TIPO_PENDENCIA.
    if det.colunas.is_empty() {
        let esperadas = MAPA_ABAS
            .iter()
            .map(|(aba, _)| format!("'{aba}'"))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(SefazError::NenhumaAbaReconhecida {
            arquivo: arquivo.to_path_buf(),
            esperadas,
        });
    }

    aplicar_prioridade(&mut det);
    preencher_colunas_operacionais(&mut det);

    Ok(det)
}

/// Contagem de pendências por prioridade, para exibição.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContagemPorPrioridade {
    pub critico: usize,
    pub alto: usize,
    pub medio: usize,
    pub total: usize,
}

pub fn contar_por_prioridade(det: &Tabela) -> ContagemPorPrioridade {
    let mut contagem = ContagemPorPrioridade {
        total: det.len(),
        ..Default::default()
    };

    for prioridade in det.coluna(COL_PRIORIDADE) {
        match prioridade {
            "CRÍTICO" => contagem.critico += 1,
            "ALTO" => contagem.alto += 1,
            "MÉDIO" => contagem.medio += 1,
            _ => {}
        }
    }

    contagem
}

/// Conta valores distintos na ordem de primeira aparição.
fn contar_na_ordem<'a>(valores: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut contagem: Vec<(&str, usize)> = Vec::new();
    for valor in valores {
        match contagem.iter().position(|(v, _)| *v == valor) {
            Some(i) => contagem[i].1 += 1,
            None => contagem.push((valor, 1)),
        }
    }
    contagem
}

/// Quantidade de pendências por `TIPO_PENDENCIA`, da mais frequente para a menos frequente.
pub fn contar_por_tipo(det: &Tabela) -> Vec<(String, usize)> {
    let mut contagem = contar_na_ordem(det.coluna(COL_TIPO_PENDENCIA));
    contagem.sort_by(|a, b| b.1.cmp(&a.1));
    contagem
        .into_iter()
        .map(|(tipo, n)| (tipo.to_string(), n))
        .collect()
}

/// Linha do resumo por CGF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumoCgf {
    pub cgf: String,
    pub qtde_pendencias: usize,
    pub qtde_critico: usize,
    pub qtde_alto: usize,
    pub tipo_mais_comum: String,
}

impl ResumoCgf {
    pub const COLUNAS: [&'static str; 5] = [
        "CGF",
        "QTDE_PENDENCIAS",
        "QTDE_CRITICO",
        "QTDE_ALTO",
        "TIPO_MAIS_COMUM",
    ];

    pub fn para_tabela(resumo: &[ResumoCgf]) -> Tabela {
        let mut tabela = Tabela::new(Self::COLUNAS.iter().map(|c| c.to_string()).collect());
        tabela.linhas = resumo
            .iter()
            .map(|r| {
                vec![
                    r.cgf.clone(),
                    r.qtde_pendencias.to_string(),
                    r.qtde_critico.to_string(),
                    r.qtde_alto.to_string(),
                    r.tipo_mais_comum.clone(),
                ]
            })
            .collect();
        tabela
    }
}

/// Agrupa as pendências por CGF.
///
/// Os grupos são formados em ordem crescente de CGF e depois ordenados (de forma
/// estável) por `QTDE_CRITICO` e `QTDE_PENDENCIAS`, ambos decrescentes.
pub fn resumir_por_cgf(det: &Tabela) -> Vec<ResumoCgf> {
    let idx_cgf = det.indice(COL_CGF);
    let idx_tipo = det.indice(COL_TIPO_PENDENCIA);
    let idx_prioridade = det.indice(COL_PRIORIDADE);

    fn celula(linha: &[String], idx: Option<usize>) -> String {
        idx.and_then(|i| linha.get(i)).cloned().unwrap_or_default()
    }

    let grupos: BTreeMap<String, Vec<&Vec<String>>> =
        det.linhas
            .iter()
            .fold(BTreeMap::new(), |mut acc, linha| {
                acc.entry(celula(linha, idx_cgf)).or_default().push(linha);
                acc
            });

    let mut resumo: Vec<ResumoCgf> = grupos
        .into_iter()
        .map(|(cgf, linhas)| {
            let prioridades: Vec<String> =
                linhas.iter().map(|l| celula(l, idx_prioridade)).collect();
            let tipos: Vec<String> = linhas.iter().map(|l| celula(l, idx_tipo)).collect();

            // Empate: vence o tipo que aparece primeiro no grupo.
            let tipo_mais_comum = contar_na_ordem(tipos.iter().map(String::as_str))
                .into_iter()
                .fold(None::<(&str, usize)>, |melhor, (tipo, n)| match melhor {
                    Some((_, m)) if m >= n => melhor,
                    _ => Some((tipo, n)),
                })
                .map(|(tipo, _)| tipo.to_string())
                .unwrap_or_default();

            ResumoCgf {
                cgf,
                qtde_pendencias: linhas.len(),
                qtde_critico: prioridades
                    .iter()
                    .filter(|p| *p == Prioridade::Critico.as_str())
                    .count(),
                qtde_alto: prioridades
                    .iter()
                    .filter(|p| *p == Prioridade::Alto.as_str())
                    .count(),
                tipo_mais_comum,
            }
        })
        .collect();

    resumo.sort_by(|a, b| {
        (b.qtde_critico, b.qtde_pendencias).cmp(&(a.qtde_critico, a.qtde_pendencias))
    });

    resumo
}

/// CGFs distintos em ordem crescente.
pub fn listar_cgfs(det: &Tabela) -> Vec<String> {
    det.coluna(COL_CGF)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Linhas de um único CGF, com o mesmo esquema da tabela de origem.
pub fn filtrar_por_cgf(det: &Tabela, cgf: &str) -> SefazResult<Tabela> {
    let mut filtrada = Tabela::new(det.colunas.clone());
    filtrada.linhas = det
        .linhas
        .iter()
        .filter(|linha| det.valor(linha, COL_CGF) == cgf)
        .cloned()
        .collect();

    if filtrada.is_empty() {
        return Err(SefazError::CgfNaoEncontrado(cgf.to_string()));
    }

    Ok(filtrada)
}
