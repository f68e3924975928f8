use execution_time::ExecutionTime;
use std::process;

use pendencias_sefaz::{
    Config, ConfigPublicacao, GoogleSheets, SefazError, SefazResult, Tabela, clear_screen,
    conta_de_servico_from_env, exportar_csv, filtrar_por_cgf, fmt_milhares, get_config,
    imprimir_cgfs, imprimir_dashboard, imprimir_detalhe, imprimir_versao_do_programa,
    ler_abas_excel, listar_cgfs, processar, publicar,
};

fn main() {
    // A forma mais idiomática de reportar erros ao usuário final sem stack trace técnico
    if let Err(err) = run() {
        eprintln!("\n[ERRO CRÍTICO]: {err}");
        process::exit(1);
    }
}

fn run() -> SefazResult<()> {
    let timer = ExecutionTime::start();

    // 1. Obter Configurações
    let config = get_config()?;

    let dotenv = dotenvy::dotenv();
    iniciar_log(config.verbose);

    // Um .env ausente não é erro: as variáveis podem vir do próprio ambiente.
    if let Err(err) = dotenv {
        log::debug!("Arquivo .env não carregado: {err}");
    }

    // 2. Setup inicial
    clear_screen(config.clear)?;
    imprimir_versao_do_programa();

    if config.verbose {
        println!("{:#?}\n", config);
    }

    let bases_ok = executar("Listagem de BASES", || listar_bases(&config));

    // 3. Upload: leitura do Excel e classificação
    let abas = ler_abas_excel(&config.arquivo)?;
    let det = processar(&config.arquivo, &abas)?;

    println!(
        " Arquivo <{}> processado com sucesso: {} pendência(s).\n",
        config.arquivo.display(),
        fmt_milhares(det.len())
    );

    // 4. Dashboard
    imprimir_dashboard(&det);

    // 5. Ações solicitadas: cada falha encerra apenas a própria ação.
    let falhas = [
        bases_ok,
        executar("Detalhamento", || detalhar(&config, &det)),
        executar("Exportação CSV", || exportar(&config, &det)),
        executar("Publicação no Google Sheets", || publicar_planilha(&config, &det)),
    ]
    .into_iter()
    .filter(|ok| !ok)
    .count();

    timer.print_elapsed_time();

    match falhas {
        0 => Ok(()),
        n => Err(SefazError::AcoesComFalha(n)),
    }
}

fn iniciar_log(verbose: bool) {
    let nivel = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(nivel))
        .format_timestamp(None)
        .init();
}

fn executar(acao: &str, f: impl FnOnce() -> SefazResult<()>) -> bool {
    match f() {
        Ok(()) => true,
        Err(err) => {
            log::error!("{acao}: {err:?}");
            eprintln!("\n [ERRO] {acao}: {err}\n");
            false
        }
    }
}

fn listar_bases(config: &Config) -> SefazResult<()> {
    if config.listar_bases {
        let publicacao = ConfigPublicacao::from_env()?;
        println!(" BASES configuradas: {}\n", publicacao.disponiveis());
    }

    Ok(())
}

fn detalhar(config: &Config, det: &Tabela) -> SefazResult<()> {
    if config.listar_cgfs {
        imprimir_cgfs(&listar_cgfs(det));
    }

    if let Some(cgf) = &config.cgf {
        let tabela = filtrar_por_cgf(det, cgf)?;
        imprimir_detalhe(cgf, &tabela);
    }

    Ok(())
}

fn exportar(config: &Config, det: &Tabela) -> SefazResult<()> {
    if let Some(dir) = &config.exportar {
        println!(" Exportando CSV para <{}>...\n", dir.display());
        exportar_csv(dir, det)?;
        println!();
    }

    Ok(())
}

fn publicar_planilha(config: &Config, det: &Tabela) -> SefazResult<()> {
    if !config.publicar {
        return Ok(());
    }

    // Toda a configuração é validada antes de qualquer chamada de rede.
    let publicacao = ConfigPublicacao::from_env()?;
    let id_planilha = publicacao.id_planilha(config.base.as_deref())?;
    let conta = conta_de_servico_from_env()?;

    println!(
        " Atualizando Google Sheets da BASE <{}> (planilha {id_planilha})...",
        config.base.as_deref().unwrap_or_default()
    );

    let mut sheets = GoogleSheets::conectar(&conta, id_planilha)?;
    publicar(det, &mut sheets)?;

    println!(" Planilha atualizada com sucesso!\n");
    Ok(())
}
