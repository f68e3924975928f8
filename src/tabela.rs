/// Aba lida do Excel, antes de qualquer normalização.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbaBruta {
    pub nome: String,
    pub cabecalho: Vec<String>,
    pub linhas: Vec<Vec<String>>,
}

/// Tabela retangular de texto: esquema ordenado de colunas e linhas alinhadas a ele.
///
/// Cada linha é uma pendência; células ausentes são representadas por "".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tabela {
    pub colunas: Vec<String>,
    pub linhas: Vec<Vec<String>>,
}

impl Tabela {
    pub fn new(colunas: Vec<String>) -> Self {
        Tabela {
            colunas,
            linhas: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.linhas.is_empty()
    }

    pub fn len(&self) -> usize {
        self.linhas.len()
    }

    pub fn indice(&self, coluna: &str) -> Option<usize> {
        self.colunas.iter().position(|c| c == coluna)
    }

    pub fn tem_coluna(&self, coluna: &str) -> bool {
        self.indice(coluna).is_some()
    }

    /// Valor de uma célula; "" se a coluna não existir.
    pub fn valor<'a>(&'a self, linha: &'a [String], coluna: &str) -> &'a str {
        self.indice(coluna)
            .and_then(|idx| linha.get(idx))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Iterador sobre os valores de uma coluna (vazio se a coluna não existir).
    pub fn coluna<'a>(&'a self, coluna: &str) -> impl Iterator<Item = &'a str> + 'a {
        let idx = self.indice(coluna);
        self.linhas.iter().filter_map(move |linha| {
            idx.map(|i| linha.get(i).map(String::as_str).unwrap_or_default())
        })
    }

    /// Completa com "" as linhas mais curtas que o esquema.
    pub fn alinhar_linhas(&mut self) {
        let largura = self.colunas.len();
        for linha in &mut self.linhas {
            if linha.len() < largura {
                linha.resize(largura, String::new());
            }
        }
    }

    /// Garante a existência da coluna e devolve o seu índice.
    /// Uma coluna nova é preenchida com `padrao` em todas as linhas.
    ///
    /// Depois da chamada toda linha tem ao menos uma célula por coluna.
    pub fn garantir_coluna(&mut self, coluna: &str, padrao: &str) -> usize {
        self.alinhar_linhas();
        if let Some(idx) = self.indice(coluna) {
            return idx;
        }
        self.colunas.push(coluna.to_string());
        for linha in &mut self.linhas {
            linha.push(padrao.to_string());
        }
        self.colunas.len() - 1
    }

    /// Atribui `valor` à coluna em todas as linhas, criando-a se preciso.
    pub fn definir_coluna(&mut self, coluna: &str, valor: &str) {
        let idx = self.garantir_coluna(coluna, valor);
        for linha in &mut self.linhas {
            linha[idx] = valor.to_string();
        }
    }

    /// Anexa as linhas de `outra` ao final, unindo os esquemas pela ordem de
    /// primeira aparição das colunas.
    pub fn concatenar(&mut self, outra: Tabela) {
        for coluna in &outra.colunas {
            self.garantir_coluna(coluna, "");
        }

        let posicoes: Vec<usize> = outra
            .colunas
            .iter()
            .filter_map(|c| self.indice(c))
            .collect();

        for linha in outra.linhas {
            let mut nova = vec![String::new(); self.colunas.len()];
            for (valor, &pos) in linha.into_iter().zip(&posicoes) {
                nova[pos] = valor;
            }
            self.linhas.push(nova);
        }
    }

    /// Cabeçalho seguido das linhas, no formato enviado ao Google Sheets.
    pub fn valores(&self) -> Vec<Vec<String>> {
        std::iter::once(self.colunas.clone())
            .chain(self.linhas.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tabela(colunas: &[&str], linhas: &[&[&str]]) -> Tabela {
        Tabela {
            colunas: colunas.iter().map(|c| c.to_string()).collect(),
            linhas: linhas
                .iter()
                .map(|l| l.iter().map(|v| v.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn concatenar_une_esquemas_pela_ordem_de_aparicao() {
        let mut a = tabela(&["CGF", "VALOR"], &[&["1", "10"]]);
        let b = tabela(&["STATUS", "CGF"], &[&["OK", "2"]]);

        a.concatenar(b);

        assert_eq!(a.colunas, vec!["CGF", "VALOR", "STATUS"]);
        assert_eq!(a.linhas[0], vec!["1", "10", ""]);
        assert_eq!(a.linhas[1], vec!["2", "", "OK"]);
    }

    #[test]
    fn garantir_coluna_nao_sobrescreve_coluna_existente() {
        let mut t = tabela(&["STATUS"], &[&["RESOLVIDO"]]);
        let idx = t.garantir_coluna("STATUS", "PENDENTE");
        assert_eq!(idx, 0);
        assert_eq!(t.linhas[0][0], "RESOLVIDO");
    }

    #[test]
    fn linhas_curtas_sao_completadas() {
        let mut t = tabela(&["CGF", "OBS"], &[&["1"], &[]]);

        t.definir_coluna("OBS", "revisar");
        let idx = t.garantir_coluna("STATUS", "PENDENTE");

        assert_eq!(idx, 2);
        assert_eq!(t.linhas[0], vec!["1", "revisar", "PENDENTE"]);
        assert_eq!(t.linhas[1], vec!["", "revisar", "PENDENTE"]);
    }

    #[test]
    fn valor_de_coluna_inexistente_e_vazio() {
        let t = tabela(&["CGF"], &[&["1"]]);
        assert_eq!(t.valor(&t.linhas[0], "OBS"), "");
        assert_eq!(t.coluna("OBS").count(), 0);
    }
}
