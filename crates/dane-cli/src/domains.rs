//! Candidate domain lists in `rank,domain` form.

use anyhow::{Context as _, Result};
use rand::Rng;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Which listed domains make it into a scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    /// Independent chance to keep each line; `None` keeps every line
    pub keep_probability: Option<f64>,
    /// Stop once this many domains are collected
    pub max: usize,
}

impl Sampling {
    /// Sampling from a configured probability, where `1.0` keeps everything.
    pub fn new(probability: f64, max: usize) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            anyhow::bail!("sample probability must be between 0 and 1, got {probability}");
        }
        Ok(Self {
            keep_probability: (probability < 1.0).then_some(probability),
            max,
        })
    }

    /// Keep every line up to `max`
    pub const fn all(max: usize) -> Self {
        Self {
            keep_probability: None,
            max,
        }
    }
}

/// Read a domain list file.
pub fn load_domains(path: &Path, sampling: &Sampling) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let domains = parse_domains(file, sampling, &mut rand::thread_rng())
        .with_context(|| format!("reading {}", path.display()))?;
    debug!(path = %path.display(), count = domains.len(), "domain list loaded");
    Ok(domains)
}

/// Parse `rank,domain` lines, sampling with `rng`.
pub fn parse_domains<R, G>(reader: R, sampling: &Sampling, rng: &mut G) -> Result<Vec<String>>
where
    R: Read,
    G: Rng + ?Sized,
{
    if let Some(p) = sampling.keep_probability {
        if !(0.0..=1.0).contains(&p) {
            anyhow::bail!("sample probability must be between 0 and 1, got {p}");
        }
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut domains = Vec::new();
    for record in reader.records() {
        if domains.len() >= sampling.max {
            break;
        }

        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);
        if record.len() != 2 {
            anyhow::bail!(
                "line {line}: expected `rank,domain`, found {} field(s)",
                record.len()
            );
        }

        let domain = &record[1];
        if domain.is_empty() {
            continue;
        }
        if let Some(p) = sampling.keep_probability {
            if !rng.gen_bool(p) {
                continue;
            }
        }
        domains.push(domain.to_string());
    }

    if domains.len() < sampling.max {
        warn!(
            collected = domains.len(),
            wanted = sampling.max,
            "domain list ran out before the maximum was reached"
        );
    }
    Ok(domains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    const LIST: &str = "1,google.com\n2,youtube.com\n3,facebook.com\n\n4,baidu.com\n5, wikipedia.org \n";

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_parse_all() {
        let domains = parse_domains(LIST.as_bytes(), &Sampling::all(100), &mut rng()).unwrap();
        assert_eq!(
            domains,
            vec![
                "google.com",
                "youtube.com",
                "facebook.com",
                "baidu.com",
                "wikipedia.org"
            ]
        );
    }

    #[test]
    fn test_parse_stops_at_max() {
        let domains = parse_domains(LIST.as_bytes(), &Sampling::all(2), &mut rng()).unwrap();
        assert_eq!(domains, vec!["google.com", "youtube.com"]);
    }

    #[test]
    fn test_sampling_bounds() {
        let none = Sampling::new(0.0, 100).unwrap();
        assert!(parse_domains(LIST.as_bytes(), &none, &mut rng())
            .unwrap()
            .is_empty());

        let every = Sampling::new(1.0, 100).unwrap();
        assert_eq!(every.keep_probability, None);
        assert_eq!(
            parse_domains(LIST.as_bytes(), &every, &mut rng())
                .unwrap()
                .len(),
            5
        );

        assert!(Sampling::new(1.5, 10).is_err());
    }

    #[test]
    fn test_sampling_keeps_a_fraction() {
        let list: String = (1..=2000).map(|i| format!("{i},d{i}.example\n")).collect();
        let sampling = Sampling::new(0.1, 10_000).unwrap();
        let kept = parse_domains(list.as_bytes(), &sampling, &mut rng()).unwrap();

        assert!((100..=300).contains(&kept.len()), "kept {}", kept.len());
        // Order of the list is preserved
        let ranks: Vec<usize> = kept
            .iter()
            .map(|d| d[1..d.find('.').unwrap()].parse().unwrap())
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        let err = parse_domains(
            "1,google.com\n2;youtube.com\n".as_bytes(),
            &Sampling::all(10),
            &mut rng(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");

        assert!(parse_domains("1,a.example,extra\n".as_bytes(), &Sampling::all(10), &mut rng()).is_err());
    }

    #[test]
    fn test_parse_skips_blank_domains() {
        let domains =
            parse_domains("1,\n2,b.example\n".as_bytes(), &Sampling::all(10), &mut rng()).unwrap();
        assert_eq!(domains, vec!["b.example"]);
    }

    #[test]
    fn test_load_domains_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LIST.as_bytes()).unwrap();

        let domains = load_domains(file.path(), &Sampling::all(3)).unwrap();
        assert_eq!(domains.len(), 3);

        assert!(load_domains(Path::new("/nonexistent/alexa.txt"), &Sampling::all(3)).is_err());
    }
}
