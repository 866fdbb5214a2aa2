//! Show how titles cluster phonetically, and how alike each cluster reads.
//! Usage: cargo run --release --bin cluster-probe -- "Climate data" "Climate change dataset"
//!        cat titles.txt | cargo run --release --bin cluster-probe

use anyhow::Result;
use clap::Parser;
use std::collections::BTreeMap;
use std::io::BufRead;

use dataset_dedup::config::DEFAULT_PHONETIC_CODE_LEN;
use dataset_dedup::detect::MIN_CLUSTER_SIZE;
use dataset_dedup::phonetic::DoubleMetaphone;
use dataset_dedup::similarity::similarity;

#[derive(Parser)]
#[command(name = "cluster-probe")]
#[command(about = "Print phonetic codes and clusters for a list of titles")]
struct Args {
    /// Titles to encode; read from stdin (one per line) when omitted
    titles: Vec<String>,

    #[arg(long, default_value_t = DEFAULT_PHONETIC_CODE_LEN)]
    code_len: usize,
}

/// Titles sharing a primary code, in input order.
fn clusters<'t>(encoder: &DoubleMetaphone, titles: &'t [String]) -> Vec<(String, Vec<&'t str>)> {
    let mut by_code: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for title in titles {
        let code = encoder.primary(title);
        if !code.is_empty() {
            by_code.entry(code).or_default().push(title);
        }
    }
    by_code
        .into_iter()
        .filter(|(_, members)| members.len() >= MIN_CLUSTER_SIZE)
        .collect()
}

/// Mean trigram similarity over all member pairs. Low values flag clusters
/// that only sound alike.
fn cohesion(members: &[&str]) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in members.iter().enumerate() {
        for b in &members[i + 1..] {
            total += similarity(a, b);
            pairs += 1;
        }
    }
    if pairs == 0 {
        return 1.0;
    }
    total / pairs as f64
}

fn main() -> Result<()> {
    let args = Args::parse();

    let titles: Vec<String> = if args.titles.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect()
    } else {
        args.titles
    };

    let encoder = DoubleMetaphone::new(args.code_len);

    println!("{:<8} {:<8} TITLE", "PRIMARY", "ALT");
    println!("{:-<60}", "");
    for title in &titles {
        let code = encoder.encode(title);
        println!("{:<8} {:<8} {}", code.primary, code.alternate, title);
    }

    let clusters = clusters(&encoder, &titles);
    println!("\n{:=<60}", "");
    println!("{} clusters of {} titles", clusters.len(), titles.len());
    for (code, members) in &clusters {
        println!("[{}] cohesion {:.2}: {}", code, cohesion(members), members.join(" | "));
    }
    println!("{:=<60}", "");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clusters_skip_singletons() {
        let input = titles(&["Climate data", "Random Dataset A", "Climate change dataset", "1999"]);
        let found = clusters(&DoubleMetaphone::default(), &input);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "KLMT");
        assert_eq!(found[0].1, vec!["Climate data", "Climate change dataset"]);
    }

    #[test]
    fn test_cohesion() {
        assert_eq!(cohesion(&["Climate data", "climate DATA"]), 1.0);
        let loose = cohesion(&["Climate data", "Climate change dataset", "Klimt paintings"]);
        assert!(loose > 0.0 && loose < 0.5);
        assert_eq!(cohesion(&["alone"]), 1.0);
    }
}
