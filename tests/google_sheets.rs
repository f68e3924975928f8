use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::path::Path;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use pendencias_sefaz::{
    ABA_DETALHE, ABA_RESUMO, AbaBruta, GoogleSheets, PublicadorDePlanilha, ResumoCgf,
    SefazError, Tabela, processar,
};

const PLANILHA: &str = "1AbC_planilha-teste";
const TOKEN: &str = "token-de-teste";

/// API falsa: planilha com as abas `existentes`; toda nova aba recebe o sheetId 42.
async fn montar_api(server: &MockServer, existentes: &[(&str, i64)]) {
    let sheets: Vec<Value> = existentes
        .iter()
        .map(|(titulo, id)| json!({ "properties": { "sheetId": id, "title": titulo } }))
        .collect();

    Mock::given(method("GET"))
        .and(path(format!("/v4/spreadsheets/{PLANILHA}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sheets": sheets })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/v4/spreadsheets/{PLANILHA}:batchUpdate")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "replies": [{ "addSheet": { "properties": { "sheetId": 42 } } }]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex(r"/values/.+:clear$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path_regex(r"/values/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(server)
        .await;
}

/// Publica `tabela` em `aba` fora do runtime assíncrono (o cliente HTTP é bloqueante).
async fn substituir(server: &MockServer, aba: &'static str, tabela: Tabela) -> Result<(), String> {
    let api = format!("{}/v4/spreadsheets", server.uri());
    tokio::task::spawn_blocking(move || -> Result<(), String> {
        let mut sheets = GoogleSheets::com_token(&api, TOKEN.to_string(), PLANILHA)
            .map_err(|e| e.to_string())?;
        sheets.substituir_aba(aba, &tabela).map_err(|e| e.to_string())
    })
    .await
    .unwrap()
}

/// Método e caminho decodificado, relativo à planilha: `POST :batchUpdate`.
fn operacao(req: &Request) -> String {
    let caminho = urlencoding::decode(req.url.path()).unwrap().into_owned();
    let prefixo = format!("/v4/spreadsheets/{PLANILHA}");
    let relativo = caminho.strip_prefix(&prefixo).unwrap_or(&caminho);
    format!("{} {relativo}", req.method.as_str())
}

fn corpo(req: &Request) -> Value {
    serde_json::from_slice(&req.body).unwrap()
}

fn dados() -> Tabela {
    let abas = vec![AbaBruta {
        nome: "Omissões de EFD".to_string(),
        cabecalho: vec!["CGF".to_string(), "Período".to_string()],
        linhas: vec![
            vec!["6123456".to_string(), "01/2024".to_string()],
            vec!["6123456".to_string(), "02/2024".to_string()],
        ],
    }];
    processar(Path::new("sefaz.xlsx"), &abas).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn aba_nova_e_criada_limpa_redimensionada_gravada_e_filtrada() {
    let server = MockServer::start().await;
    montar_api(&server, &[("Página1", 0)]).await;

    let det = dados();
    substituir(&server, ABA_DETALHE, det.clone()).await.unwrap();

    let reqs = server.received_requests().await.unwrap();
    let operacoes: Vec<String> = reqs.iter().map(operacao).collect();
    assert_eq!(
        operacoes,
        vec![
            "GET ".to_string(),
            "POST :batchUpdate".to_string(),
            "POST /values/'PENDENCIAS_DETALHE':clear".to_string(),
            "POST :batchUpdate".to_string(),
            "PUT /values/'PENDENCIAS_DETALHE'!A1".to_string(),
            "POST :batchUpdate".to_string(),
        ]
    );

    for req in &reqs {
        let auth = req.headers.get("authorization").unwrap().to_str().unwrap();
        assert_eq!(auth, format!("Bearer {TOKEN}"));
    }
    assert!(reqs[0].url.query_pairs().any(|(k, _)| k == "fields"));

    let criar = &corpo(&reqs[1])["requests"][0]["addSheet"]["properties"];
    assert_eq!(criar["title"], ABA_DETALHE);
    assert_eq!(
        criar["gridProperties"],
        json!({ "rowCount": 2000, "columnCount": 120 })
    );

    // 3 linhas (cabeçalho + 2) e as colunas do detalhe, com mínimo de 10 x 5.
    let redimensionar = &corpo(&reqs[3])["requests"][0]["updateSheetProperties"];
    assert_eq!(redimensionar["properties"]["sheetId"], 42);
    assert_eq!(
        redimensionar["properties"]["gridProperties"],
        json!({ "rowCount": 10, "columnCount": det.colunas.len().max(5) })
    );

    assert!(
        reqs[4]
            .url
            .query_pairs()
            .any(|(k, v)| k == "valueInputOption" && v == "RAW")
    );
    let gravado = corpo(&reqs[4]);
    assert_eq!(gravado["majorDimension"], "ROWS");
    assert_eq!(gravado["values"], json!(det.valores()));

    let formatacao = &corpo(&reqs[5])["requests"];
    assert_eq!(
        formatacao[0]["updateSheetProperties"]["properties"]["gridProperties"]["frozenRowCount"],
        1
    );
    assert_eq!(formatacao[1]["setBasicFilter"]["filter"]["range"]["sheetId"], 42);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn resumo_sem_linhas_grava_sem_dados_sem_redimensionar() {
    let server = MockServer::start().await;
    montar_api(&server, &[]).await;

    substituir(&server, ABA_RESUMO, ResumoCgf::para_tabela(&[]))
        .await
        .unwrap();

    let reqs = server.received_requests().await.unwrap();
    let operacoes: Vec<String> = reqs.iter().map(operacao).collect();
    assert_eq!(
        operacoes,
        vec![
            "GET ".to_string(),
            "POST :batchUpdate".to_string(),
            "POST /values/'RESUMO_POR_CGF':clear".to_string(),
            "PUT /values/'RESUMO_POR_CGF'!A1".to_string(),
        ]
    );

    assert_eq!(
        corpo(&reqs[1])["requests"][0]["addSheet"]["properties"]["gridProperties"],
        json!({ "rowCount": 2000, "columnCount": 50 })
    );
    assert_eq!(corpo(&reqs[3])["values"], json!([["SEM DADOS"]]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn aba_existente_nao_e_recriada() {
    let server = MockServer::start().await;
    montar_api(&server, &[(ABA_DETALHE, 7)]).await;

    substituir(&server, ABA_DETALHE, dados()).await.unwrap();

    let reqs = server.received_requests().await.unwrap();
    assert_eq!(reqs.len(), 5);
    assert_eq!(operacao(&reqs[1]), "POST /values/'PENDENCIAS_DETALHE':clear");
    assert_eq!(
        corpo(&reqs[2])["requests"][0]["updateSheetProperties"]["properties"]["sheetId"],
        7
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn resposta_nao_2xx_vira_erro_com_status_e_corpo() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v4/spreadsheets/{PLANILHA}")))
        .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
        .mount(&server)
        .await;

    let api = format!("{}/v4/spreadsheets", server.uri());
    let erro = tokio::task::spawn_blocking(move || {
        match GoogleSheets::com_token(&api, TOKEN.to_string(), PLANILHA) {
            Err(SefazError::ApiGoogle { status, corpo, .. }) => (status, corpo),
            Err(outro) => panic!("erro inesperado: {outro}"),
            Ok(_) => panic!("a conexão deveria falhar"),
        }
    })
    .await
    .unwrap();

    assert_eq!(erro, (403, "PERMISSION_DENIED".to_string()));
}
