//! Utilitários de fuzzy matching e normalização de strings
//!
//! Usado para converter texto digitado por humanos (tipo de entidade, nome de
//! etapa do funil) em identificadores da API antes de montar a requisição.

use deunicode::deunicode;
use strsim::jaro_winkler;

/// Normaliza uma string para comparação fuzzy
///
/// - Remove acentos e translitera outros alfabetos (deunicode)
/// - Converte para lowercase
/// - Remove espaços extras
///
/// # Exemplos
///
/// ```
/// use pachca::matching::normalize;
///
/// assert_eq!(normalize("  Сделка "), "sdelka");
/// assert_eq!(normalize("ANDRÉ"), "andre");
/// ```
pub fn normalize(text: &str) -> String {
    deunicode(text).to_lowercase().trim().to_string()
}

/// Peso do match parcial (consulta contida em um nome mais longo)
const PARTIAL_WEIGHT: f64 = 0.9;

/// Confiança na escala 0–100 de que `query` se refere a `candidate`
///
/// Maior valor entre a similaridade da string inteira, a similaridade com a
/// melhor palavra do candidato e a da melhor janela do candidato com o
/// tamanho da consulta (ponderada por `PARTIAL_WEIGHT`).
///
/// ```
/// use pachca::matching::score;
///
/// assert_eq!(score("Клиент", "клиент"), 100);
/// assert_eq!(score("won", "Closed won"), 100);
/// assert!(score("Deal", "Organization") < 70);
/// ```
pub fn score(query: &str, candidate: &str) -> u8 {
    let query = normalize(query);
    let candidate = normalize(candidate);

    let whole = jaro_winkler(&query, &candidate);
    let token = candidate
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| jaro_winkler(&query, t))
        .fold(0.0, f64::max);
    let partial = partial_similarity(&query, &candidate) * PARTIAL_WEIGHT;

    (whole.max(token).max(partial) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Melhor Jaro-Winkler entre `query` e as janelas de `candidate` com o mesmo
/// número de caracteres; zero quando a consulta não é mais curta
fn partial_similarity(query: &str, candidate: &str) -> f64 {
    let query_len = query.chars().count();
    let chars: Vec<char> = candidate.chars().collect();

    if query_len < 2 || query_len >= chars.len() {
        return 0.0;
    }

    chars
        .windows(query_len)
        .map(|window| jaro_winkler(query, &window.iter().collect::<String>()))
        .fold(0.0, f64::max)
}

/// Melhor candidato encontrado por [`best_match`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'a> {
    /// Candidato vencedor
    pub candidate: &'a str,
    /// Posição do candidato na lista original
    pub index: usize,
    /// Confiança (0–100)
    pub score: u8,
}

/// Retorna o candidato mais parecido com `query`
///
/// Em caso de empate vence o primeiro da lista. `None` apenas quando não há
/// candidatos.
pub fn best_match<'a, S: AsRef<str>>(query: &str, candidates: &'a [S]) -> Option<Match<'a>> {
    let mut best: Option<Match<'a>> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        let candidate = candidate.as_ref();
        let candidate_score = score(query, candidate);

        if best.as_ref().map_or(true, |b| candidate_score > b.score) {
            best = Some(Match {
                candidate,
                index,
                score: candidate_score,
            });
        }
    }

    best
}

/// Política de aceitação do match de etapas (`stage_id` em texto livre)
///
/// Tipos de entidade sempre exigem confiança mínima; etapas aceitam o primeiro
/// colocado por padrão.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageMatchPolicy {
    /// O primeiro colocado sempre vence, mesmo com score baixo
    #[default]
    BestMatch,
    /// Exige score estritamente maior que o valor
    MinScore(u8),
}

impl StageMatchPolicy {
    /// Verifica se um score é aceito pela política
    pub fn accepts(&self, score: u8) -> bool {
        match self {
            Self::BestMatch => true,
            Self::MinScore(min) => score > *min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("José da Silva"), "jose da silva");
        assert_eq!(normalize("  Клиент  "), "klient");
        assert_eq!(normalize("DEAL"), "deal");
    }

    #[test]
    fn test_score_bounds() {
        assert_eq!(score("Client", "Client"), 100);
        assert_eq!(score("Client", "client "), 100);
        assert!(score("zzz-unrelated", "Organization") < 70);
        assert!(score("Clients", "Client") > 90);
    }

    #[test]
    fn test_best_match_picks_highest() {
        let candidates = ["New#1", "In progress#2", "Won#3", "Lost#4"];
        let m = best_match("Won", &candidates).unwrap();
        assert_eq!(m.candidate, "Won#3");
        assert_eq!(m.index, 2);
    }

    #[test]
    fn test_partial_and_token_matches() {
        assert_eq!(score("won", "Closed won"), 100);
        assert!(score("orgs", "Organization") > 70);
        assert!(score("negot", "Negotiation") > 80);
        // consulta mais longa que o candidato não usa janelas
        assert_eq!(partial_similarity("zzz-unrelated", "deal"), 0.0);
    }

    #[test]
    fn test_best_match_prefers_word_inside_longer_name() {
        let candidates = ["Новый", "Переговоры", "Успешно реализовано", "Closed won", "Closed lost"];
        let m = best_match("won", &candidates).unwrap();
        assert_eq!(m.candidate, "Closed won");
        assert_eq!(m.score, 100);
    }

    #[test]
    fn test_best_match_tie_keeps_first() {
        let candidates = ["deal", "Deal"];
        let m = best_match("DEAL", &candidates).unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.score, 100);
    }

    #[test]
    fn test_best_match_empty() {
        let candidates: [&str; 0] = [];
        assert!(best_match("anything", &candidates).is_none());
    }

    #[test]
    fn test_stage_policy() {
        assert!(StageMatchPolicy::BestMatch.accepts(0));
        assert!(StageMatchPolicy::MinScore(70).accepts(71));
        assert!(!StageMatchPolicy::MinScore(70).accepts(70));
        assert_eq!(StageMatchPolicy::default(), StageMatchPolicy::BestMatch);
    }
}
