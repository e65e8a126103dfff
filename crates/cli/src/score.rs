//! `titlematch score`: inspect normalization and similarity for one pair.

use serde::Serialize;
use titlematch_resolver::{Normalizer, Resolver, Scorer};

use crate::CliError;

#[derive(Debug, Serialize)]
struct ScoreOutput<'a> {
    a: &'a str,
    b: &'a str,
    normalized_a: String,
    normalized_b: String,
    scorer: Scorer,
    score: u8,
}

pub fn cmd_score(a: &str, b: &str, scorer: Scorer, json: bool) -> Result<(), CliError> {
    let resolver = Resolver::new(Normalizer::default(), scorer);
    let output = ScoreOutput {
        a,
        b,
        normalized_a: resolver.normalizer.normalize(a),
        normalized_b: resolver.normalizer.normalize(b),
        scorer,
        score: resolver.score_pair(a, b),
    };

    if json {
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::other(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        println!("a:      {:?}", output.normalized_a);
        println!("b:      {:?}", output.normalized_b);
        println!("{}: {}", output.scorer, output.score);
    }
    Ok(())
}
