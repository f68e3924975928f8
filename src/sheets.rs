use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::{collections::HashMap, time::Duration};

use crate::{
    ABA_DETALHE, ABA_FILA, ABA_RESUMO, ResumoCgf, SefazError, SefazResult, Tabela,
    resumir_por_cgf,
};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const GRANT_TYPE_JWT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];
const TIMEOUT: Duration = Duration::from_secs(60);

/// Destino de publicação: substitui integralmente o conteúdo de uma aba.
pub trait PublicadorDePlanilha {
    /// Grava `tabela` (cabeçalho + linhas) na aba `aba`, criando-a se não existir
    /// e apagando o conteúdo anterior.
    fn substituir_aba(&mut self, aba: &str, tabela: &Tabela) -> SefazResult<()>;
}

/// Publica detalhe, resumo por CGF e fila de trabalho, nesta ordem.
///
/// Uma falha interrompe a sequência; abas já gravadas permanecem atualizadas.
pub fn publicar<P>(det: &Tabela, publicador: &mut P) -> SefazResult<()>
where
    P: PublicadorDePlanilha + ?Sized,
{
    let resumo = ResumoCgf::para_tabela(&resumir_por_cgf(det));
    let fila = det.clone();

    for (aba, tabela) in [(ABA_DETALHE, det), (ABA_RESUMO, &resumo), (ABA_FILA, &fila)] {
        log::info!("Publicando aba <{}>: {} linha(s)", aba, tabela.len());
        publicador
            .substituir_aba(aba, tabela)
            .map_err(|e| e.na_aba(aba))?;
    }

    Ok(())
}

/// Chave JSON de uma conta de serviço Google (somente os campos usados).
#[derive(Debug, Clone, Deserialize)]
pub struct ContaDeServico {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "token_uri_padrao")]
    pub token_uri: String,
}

fn token_uri_padrao() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct Planilha {
    #[serde(default)]
    sheets: Vec<Aba>,
}

#[derive(Deserialize)]
struct Aba {
    properties: PropriedadesDaAba,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropriedadesDaAba {
    sheet_id: i64,
    title: String,
}

/// Cliente síncrono da API Google Sheets v4 para uma única planilha.
pub struct GoogleSheets {
    client: Client,
    api: String,
    token: String,
    id_planilha: String,
    abas: HashMap<String, i64>,
}

impl GoogleSheets {
    /// Autentica com a conta de serviço e carrega as abas existentes da planilha.
    pub fn conectar(conta: &ContaDeServico, id_planilha: &str) -> SefazResult<Self> {
        let client = Client::builder().timeout(TIMEOUT).build()?;
        let token = obter_token(&client, conta)?;
        Self::abrir(client, SHEETS_API, token, id_planilha)
    }

    /// Usa um token de acesso já emitido e a raiz `api` informada
    /// (por exemplo `http://127.0.0.1:8080/v4/spreadsheets`).
    pub fn com_token(api: &str, token: String, id_planilha: &str) -> SefazResult<Self> {
        let client = Client::builder().timeout(TIMEOUT).build()?;
        Self::abrir(client, api, token, id_planilha)
    }

    fn abrir(client: Client, api: &str, token: String, id_planilha: &str) -> SefazResult<Self> {
        let mut sheets = GoogleSheets {
            client,
            api: api.trim_end_matches('/').to_string(),
            token,
            id_planilha: id_planilha.to_string(),
            abas: HashMap::new(),
        };
        sheets.carregar_abas()?;

        Ok(sheets)
    }

    fn url(&self, sufixo: &str) -> String {
        format!("{}/{}{sufixo}", self.api, self.id_planilha)
    }

    fn url_valores(&self, intervalo: &str, acao: &str) -> String {
        self.url(&format!(
            "/values/{}{acao}",
            urlencoding::encode(intervalo)
        ))
    }

    fn carregar_abas(&mut self) -> SefazResult<()> {
        let resp = self
            .client
            .get(self.url(""))
            .bearer_auth(&self.token)
            .query(&[("fields", "sheets.properties(sheetId,title)")])
            .send()?;
        let planilha: Planilha = verificar(resp, "leitura da planilha")?.json()?;

        self.abas = planilha
            .sheets
            .into_iter()
            .map(|aba| (aba.properties.title, aba.properties.sheet_id))
            .collect();

        log::debug!("Abas existentes: {:?}", self.abas);
        Ok(())
    }

    fn batch_update(&self, requests: Vec<Value>, operacao: &str) -> SefazResult<Value> {
        let resp = self
            .client
            .post(self.url(":batchUpdate"))
            .bearer_auth(&self.token)
            .json(&json!({ "requests": requests }))
            .send()?;
        Ok(verificar(resp, operacao)?.json()?)
    }

    fn obter_ou_criar_aba(&mut self, aba: &str, linhas: usize, colunas: usize) -> SefazResult<i64> {
        if let Some(&id) = self.abas.get(aba) {
            return Ok(id);
        }

        log::info!("Criando aba <{aba}> ({linhas} x {colunas})");
        let resposta = self.batch_update(
            vec![requisicao_criar_aba(aba, linhas, colunas)],
            "criação de aba",
        )?;

        let id = resposta["replies"][0]["addSheet"]["properties"]["sheetId"]
            .as_i64()
            .ok_or_else(|| SefazError::ApiGoogle {
                operacao: "criação de aba".to_string(),
                status: 200,
                corpo: resposta.to_string(),
            })?;

        self.abas.insert(aba.to_string(), id);
        Ok(id)
    }

    fn limpar(&self, aba: &str) -> SefazResult<()> {
        let resp = self
            .client
            .post(self.url_valores(&intervalo_a1(aba, None), ":clear"))
            .bearer_auth(&self.token)
            .json(&json!({}))
            .send()?;
        verificar(resp, "limpeza da aba")?;
        Ok(())
    }

    fn gravar_valores(&self, aba: &str, valores: &[Vec<String>]) -> SefazResult<()> {
        let intervalo = intervalo_a1(aba, Some("A1"));
        let resp = self
            .client
            .put(self.url_valores(&intervalo, ""))
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({
                "range": intervalo,
                "majorDimension": "ROWS",
                "values": valores,
            }))
            .send()?;
        verificar(resp, "gravação de valores")?;
        Ok(())
    }
}

impl PublicadorDePlanilha for GoogleSheets {
    fn substituir_aba(&mut self, aba: &str, tabela: &Tabela) -> SefazResult<()> {
        let (linhas, colunas) = tamanho_inicial(aba, tabela);
        let sheet_id = self.obter_ou_criar_aba(aba, linhas, colunas)?;

        self.limpar(aba)?;

        if tabela.is_empty() {
            return self.gravar_valores(aba, &[vec!["SEM DADOS".to_string()]]);
        }

        let valores = tabela.valores();
        let (linhas, colunas) = (valores.len().max(10), tabela.colunas.len().max(5));

        self.batch_update(
            vec![requisicao_redimensionar(sheet_id, linhas, colunas)],
            "redimensionamento da aba",
        )?;
        self.gravar_valores(aba, &valores)?;
        self.batch_update(requisicoes_de_formatacao(sheet_id), "congelamento e filtro")?;

        Ok(())
    }
}

fn obter_token(client: &Client, conta: &ContaDeServico) -> SefazResult<String> {
    let agora = Utc::now().timestamp();
    let claims = Claims {
        iss: &conta.client_email,
        scope: SCOPES.join(" "),
        aud: &conta.token_uri,
        iat: agora,
        exp: agora + 3600,
    };

    let chave = EncodingKey::from_rsa_pem(conta.private_key.as_bytes())?;
    let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &chave)?;

    let resp = client
        .post(&conta.token_uri)
        .form(&[("grant_type", GRANT_TYPE_JWT), ("assertion", assertion.as_str())])
        .send()?;
    let token: TokenResponse = verificar(resp, "autenticação")?.json()?;

    log::debug!("Token obtido para <{}>", conta.client_email);
    Ok(token.access_token)
}

/// Converte respostas não-2xx em `SefazError::ApiGoogle` com o corpo completo.
fn verificar(resp: Response, operacao: &str) -> SefazResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    Err(SefazError::ApiGoogle {
        operacao: operacao.to_string(),
        status: status.as_u16(),
        corpo: resp.text().unwrap_or_default(),
    })
}

/// Intervalo A1 com o nome da aba entre aspas simples.
///
/// ```
/// use pendencias_sefaz::intervalo_a1;
///
/// assert_eq!(intervalo_a1("FILA_TRABALHO", Some("A1")), "'FILA_TRABALHO'!A1");
/// assert_eq!(intervalo_a1("D'Ávila", None), "'D''Ávila'");
/// ```
pub fn intervalo_a1(aba: &str, celula: Option<&str>) -> String {
    let aba = format!("'{}'", aba.replace('\'', "''"));
    match celula {
        Some(celula) => format!("{aba}!{celula}"),
        None => aba,
    }
}

/// Tamanho de criação de uma aba nova: folga de linhas e colunas suficientes
/// para o detalhe (120) ou para o resumo (50).
pub fn tamanho_inicial(aba: &str, tabela: &Tabela) -> (usize, usize) {
    let linhas = (tabela.len() + 20).max(2000);
    let colunas = if aba == ABA_RESUMO { 50 } else { 120 };
    (linhas, colunas.max(tabela.colunas.len()))
}

fn requisicao_criar_aba(aba: &str, linhas: usize, colunas: usize) -> Value {
    json!({
        "addSheet": {
            "properties": {
                "title": aba,
                "gridProperties": { "rowCount": linhas, "columnCount": colunas }
            }
        }
    })
}

fn requisicao_redimensionar(sheet_id: i64, linhas: usize, colunas: usize) -> Value {
    json!({
        "updateSheetProperties": {
            "properties": {
                "sheetId": sheet_id,
                "gridProperties": { "rowCount": linhas, "columnCount": colunas }
            },
            "fields": "gridProperties(rowCount,columnCount)"
        }
    })
}

fn requisicoes_de_formatacao(sheet_id: i64) -> Vec<Value> {
    vec![
        json!({
            "updateSheetProperties": {
                "properties": {
                    "sheetId": sheet_id,
                    "gridProperties": { "frozenRowCount": 1 }
                },
                "fields": "gridProperties.frozenRowCount"
            }
        }),
        json!({
            "setBasicFilter": { "filter": { "range": { "sheetId": sheet_id } } }
        }),
    ]
}
