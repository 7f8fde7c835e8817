//! Streaming reader for Les Houches Event (LHE) files.

use super::*;
use lhef::HEPEUP;
use regex::Regex;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};
use xmltree::{Element, XMLNode};

fn canonicalize_event_path(file_path: &str) -> HepdistResult<PathBuf> {
    Ok(Path::new(&*shellexpand::full(file_path)?).canonicalize()?)
}

/// The name under which the event weight from the `<event>` header line (`XWGTUP`) is stored
/// unless the event also carries an explicit `<wgt id='0'>`.
pub const HEADER_WEIGHT: &str = "0";

/// An [`Iterator`] over the events of an LHE file.
///
/// The event records are read with [`lhef::Reader`]. The named weights are taken from the
/// `<wgt id='...'>` entries of the `<rwgt>` (or `<weights>`) block that follows the particle
/// list, together with the header weight ([`HEADER_WEIGHT`]).
///
/// Parsing errors are yielded once, after which the iterator is exhausted.
pub struct LheReader<R: BufRead> {
    reader: lhef::Reader<R>,
    events_read: usize,
    weight_filter: Option<Regex>,
    finished: bool,
}

impl LheReader<BufReader<File>> {
    /// Open an LHE file for reading. `~` and environment variables in the path are expanded.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or its header and `<init>` block are malformed.
    pub fn open(file_path: &str) -> HepdistResult<Self> {
        let path = canonicalize_event_path(file_path)?;
        tracing::info!(path = %path.display(), "opening LHE file");
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: BufRead> LheReader<R> {
    /// Create a reader over any buffered source of LHE text. The file header and the `<init>`
    /// block are read immediately.
    ///
    /// # Errors
    ///
    /// Returns [`HepdistError::LheHeaderError`] if the source does not start with a valid LHE
    /// header.
    pub fn new(reader: R) -> HepdistResult<Self> {
        let reader =
            lhef::Reader::new(reader).map_err(|err| HepdistError::LheHeaderError(err.to_string()))?;
        Ok(Self {
            reader,
            events_read: 0,
            weight_filter: None,
            finished: false,
        })
    }

    /// Only keep weights whose names match `pattern` in full, e.g. `(1|.*Coup.*)` keeps the
    /// nominal weight and every reweighting scenario with `Coup` in its name.
    pub fn with_weight_filter(mut self, pattern: &str) -> HepdistResult<Self> {
        self.weight_filter = Some(Regex::new(&format!("^(?:{pattern})$"))?);
        Ok(self)
    }

    /// The number of events successfully read so far.
    pub fn events_read(&self) -> usize {
        self.events_read
    }

    fn error(&self, reason: impl Into<String>) -> HepdistError {
        HepdistError::LheParseError {
            event: self.events_read,
            reason: reason.into(),
        }
    }

    fn keep_weight(&self, name: &str) -> bool {
        self.weight_filter
            .as_ref()
            .map_or(true, |filter| filter.is_match(name))
    }

    fn convert(&self, hepeup: HEPEUP) -> HepdistResult<Event> {
        let particles = hepeup
            .IDUP
            .iter()
            .zip(&hepeup.ISTUP)
            .zip(&hepeup.PUP)
            .map(|((&pdgid, &status), p)| Particle {
                pdgid,
                status,
                p4: Vec4::new(p[0], p[1], p[2], p[3]),
            })
            .collect();

        let mut weights = IndexMap::new();
        if self.keep_weight(HEADER_WEIGHT) {
            weights.insert(HEADER_WEIGHT.to_string(), hepeup.XWGTUP);
        }
        for (name, value) in parse_weights(&hepeup.info).map_err(|reason| self.error(reason))? {
            if self.keep_weight(&name) {
                weights.insert(name, value);
            }
        }
        Ok(Event { particles, weights })
    }
}

impl<R: BufRead> Iterator for LheReader<R> {
    type Item = HepdistResult<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = match self.reader.hepeup() {
            Ok(Some(hepeup)) => self.convert(hepeup),
            Ok(None) => {
                tracing::debug!(events = self.events_read, "reached end of LHE file");
                self.finished = true;
                return None;
            }
            Err(err) => Err(self.error(err.to_string())),
        };
        match result {
            Ok(_) => self.events_read += 1,
            Err(_) => self.finished = true,
        }
        Some(result)
    }
}

/// Parse a floating-point number, also accepting Fortran-style `D` exponents.
fn parse_f64(token: &str) -> Option<f64> {
    token
        .parse::<f64>()
        .ok()
        .or_else(|| token.replace(['D', 'd'], "e").parse::<f64>().ok())
}

/// Collect the `<wgt id='name'> value </wgt>` entries of the `<rwgt>` and `<weights>` blocks
/// in the free-form information which follows the particle list of an event.
fn parse_weights(info: &str) -> Result<Vec<(String, f64)>, String> {
    if !info.contains("<wgt") {
        return Ok(Vec::new());
    }
    let wrapped = format!("<info>{info}</info>");
    let root = Element::parse(wrapped.as_bytes())
        .map_err(|err| format!("invalid event information: {err}"))?;
    let mut weights = Vec::new();
    let blocks = root
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(|block| block.name == "rwgt" || block.name == "weights");
    for block in blocks {
        for wgt in block
            .children
            .iter()
            .filter_map(XMLNode::as_element)
            .filter(|wgt| wgt.name == "wgt")
        {
            let name = wgt
                .attributes
                .get("id")
                .ok_or_else(|| "weight without an id attribute".to_string())?
                .trim()
                .to_string();
            let text = wgt
                .get_text()
                .map(|text| text.trim().to_string())
                .unwrap_or_default();
            let value = parse_f64(&text)
                .ok_or_else(|| format!("invalid value for weight \"{name}\": \"{text}\""))?;
            weights.push((name, value));
        }
    }
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use std::io::Cursor;

    use super::*;

    const HEADER: &str = r#"<LesHouchesEvents version="3.0">
<header>
<initrwgt>
<weightgroup name='mg_reweighting'>
<weight id='Coup-1p0'>set couplings 1.0</weight>
<weight id='Coup-0p1'>set couplings 0.1</weight>
</weightgroup>
</initrwgt>
</header>
<init>
2212 2212 6.500000e+03 6.500000e+03 0 0 247000 247000 -4 1
1.2e-02 3.4e-05 1.2e-02 1
</init>
"#;

    const TWO_EVENTS: &str = r#"<event>
 5      1 +1.2000000e-02 3.75000000e+02 7.54677100e-03 1.08003900e-01
        2 -1    0    0  501    0 +0.0000000000e+00 +0.0000000000e+00 +4.5000000000e+02 4.5000000000e+02 0.0000000000e+00 0.0000e+00 1.0000e+00
       -2 -1    0    0    0  501 -0.0000000000e+00 -0.0000000000e+00 -3.5000000000e+02 3.5000000000e+02 0.0000000000e+00 0.0000e+00 -1.0000e+00
       32  2    1    2    0    0 +0.0000000000e+00 +0.0000000000e+00 +1.0000000000e+02 8.0000000000e+02 7.9373640000e+02 0.0000e+00 0.0000e+00
       13  1    3    3    0    0 +3.0000000000e+02 +1.0000000000e+02 +2.0000000000e+02 3.7416573868e+02 1.0566000000e-01 0.0000e+00 -1.0000e+00
      -13  1    3    3    0    0 -3.0000000000e+02 -1.0000000000e+02 -1.0000000000e+02 3.3166247904e+02 1.0566000000e-01 0.0000e+00 1.0000e+00
<mgrwt>
<rscale>  0 0.37500000E+03</rscale>
</mgrwt>
<rwgt>
<wgt id='1'> +1.2000000e-02 </wgt>
<wgt id='Coup-1p0'> +2.4000000e-02 </wgt>
<wgt id="Coup-0p1"> 6.0000000D-03 </wgt>
<wgt id='mg_scale_up'> +1.5000000e-02 </wgt>
</rwgt>
</event>
<event>
 3      1 +1.2000000e-02 3.75000000e+02 7.54677100e-03 1.08003900e-01
        21 -1    0    0  501  502 +0.0000000000e+00 +0.0000000000e+00 +4.5000000000e+02 4.5000000000e+02 0.0000000000e+00 0.0000e+00 1.0000e+00
        21 -1    0    0  502  501 -0.0000000000e+00 -0.0000000000e+00 -3.5000000000e+02 3.5000000000e+02 0.0000000000e+00 0.0000e+00 -1.0000e+00
        22  1    1    2    0    0 +0.0000000000e+00 +0.0000000000e+00 +1.0000000000e+02 8.0000000000e+02 0.0000000000e+00 0.0000e+00 0.0000e+00
<rwgt><wgt id='1'> 1.2e-02 </wgt><wgt id='Coup-1p0'> 0.0 </wgt><wgt id='Coup-0p1'> 3.0e-03 </wgt></rwgt>
</event>
"#;

    fn lhe_file(events: &str) -> String {
        format!("{HEADER}{events}</LesHouchesEvents>\n")
    }

    fn reader(text: &str) -> LheReader<Cursor<&[u8]>> {
        LheReader::new(Cursor::new(text.as_bytes())).unwrap()
    }

    fn single_muon_event(weight: &str, trailer: &str) -> String {
        format!(
            "<event>
 1 1 {weight} 1.0e+02 7.5e-03 1.1e-01
 13 1 0 0 0 0 1.0e+01 0.0e+00 0.0e+00 1.0e+01 0.0e+00 0.0e+00 9.0e+00
{trailer}"
        )
    }

    #[test]
    fn test_read_events() {
        let text = lhe_file(TWO_EVENTS);
        let events: Vec<Event> = reader(&text).collect::<HepdistResult<_>>().unwrap();
        assert_eq!(events.len(), 2);

        let first = &events[0];
        assert_eq!(first.particles.len(), 5);
        let pdgids: Vec<i32> = first.particles.iter().map(|p| p.pdgid).collect();
        assert_eq!(pdgids, vec![2, -2, 32, 13, -13]);
        assert_eq!(first.particles[0].status, -1);
        assert_eq!(first.particles[2].status, 2);
        let mu = first.particles[3].p4;
        assert_relative_eq!(mu.px(), 300.0);
        assert_relative_eq!(mu.py(), 100.0);
        assert_relative_eq!(mu.pz(), 200.0);
        assert_relative_eq!(mu.e(), 374.16573868);

        let names: Vec<&str> = first.weights.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["0", "1", "Coup-1p0", "Coup-0p1", "mg_scale_up"]);
        assert_relative_eq!(first.weight("0").unwrap(), 0.012);
        assert_relative_eq!(first.weight("Coup-1p0").unwrap(), 0.024);
        assert_relative_eq!(first.weight("Coup-0p1").unwrap(), 0.006);

        let second = &events[1];
        assert_eq!(second.leptons().count(), 0);
        assert_relative_eq!(second.weight("Coup-1p0").unwrap(), 0.0);
        assert_relative_eq!(second.weight("Coup-0p1").unwrap(), 0.003);
    }

    #[test]
    fn test_weight_filter() {
        let text = lhe_file(TWO_EVENTS);
        let mut lhe = reader(&text).with_weight_filter("(1|.*Coup.*)").unwrap();
        let event = lhe.next().unwrap().unwrap();
        let names: Vec<&str> = event.weights.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["1", "Coup-1p0", "Coup-0p1"]);
        assert!(lhe.next().unwrap().is_ok());
        assert!(lhe.next().is_none());
        assert_eq!(lhe.events_read(), 2);
    }

    #[test]
    fn test_invalid_weight_filter() {
        let text = lhe_file(TWO_EVENTS);
        assert!(matches!(
            reader(&text).with_weight_filter("(unclosed"),
            Err(HepdistError::RegexError(_))
        ));
    }

    #[test]
    fn test_close_tag_on_weight_line() {
        let events = format!(
            "{}{}",
            single_muon_event(
                "1.0e+00",
                "<rwgt><wgt id='1'> 1.0 </wgt></rwgt></event>\n"
            ),
            single_muon_event("5.0e+00", "<rwgt><wgt id='1'> 5.0 </wgt></rwgt>\n</event>\n"),
        );
        let text = lhe_file(&events);
        let events: Vec<Event> = reader(&text).collect::<HepdistResult<_>>().unwrap();
        assert_eq!(events.len(), 2);
        assert_relative_eq!(events[0].nominal_weight().unwrap(), 1.0);
        assert_relative_eq!(events[1].nominal_weight().unwrap(), 5.0);
        assert_eq!(events[0].particles.len(), 1);
        assert_eq!(events[1].particles.len(), 1);
    }

    #[test]
    fn test_explicit_zero_weight_replaces_header_weight() {
        let text = lhe_file(&single_muon_event(
            "1.0e+00",
            "<rwgt>\n<wgt id='0'> 3.0 </wgt>\n<wgt id='1'> 2.0 </wgt>\n</rwgt>\n</event>\n",
        ));
        let event = reader(&text).next().unwrap().unwrap();
        assert_eq!(event.weights.len(), 2);
        assert_relative_eq!(event.weight(HEADER_WEIGHT).unwrap(), 3.0);
        assert_relative_eq!(event.nominal_weight().unwrap(), 2.0);
    }

    #[test]
    fn test_event_without_weights_block() {
        let text = lhe_file(&single_muon_event("2.5e+00", "</event>\n"));
        let event = reader(&text).next().unwrap().unwrap();
        assert_eq!(event.weights.len(), 1);
        assert_relative_eq!(event.weight(HEADER_WEIGHT).unwrap(), 2.5);
        assert_eq!(event.nominal_weight(), None);
    }

    #[test]
    fn test_truncated_file() {
        let text = lhe_file(TWO_EVENTS);
        let truncated = &text[..text.find("<mgrwt>").unwrap()];
        let mut lhe = reader(truncated);
        assert!(matches!(lhe.next(), Some(Err(_))));
        assert!(lhe.next().is_none());
        assert_eq!(lhe.events_read(), 0);
    }

    #[test]
    fn test_malformed_weight_value() {
        let text = lhe_file(&single_muon_event(
            "1.0e+00",
            "<rwgt><wgt id='1'> abc </wgt></rwgt>\n</event>\n",
        ));
        match reader(&text).next() {
            Some(Err(HepdistError::LheParseError { event, reason })) => {
                assert_eq!(event, 0);
                assert!(reason.contains("abc"));
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            LheReader::new(Cursor::new("".as_bytes())),
            Err(HepdistError::LheHeaderError(_))
        ));
        assert!(matches!(
            LheReader::new(Cursor::new("<event>\n</event>\n".as_bytes())),
            Err(HepdistError::LheHeaderError(_))
        ));
    }

    #[test]
    fn test_no_events() {
        let text = lhe_file("");
        assert!(reader(&text).next().is_none());
    }

    #[test]
    fn test_parse_weights() {
        let weights = parse_weights(
            "<mgrwt>\n<rscale> 0 0.375E+03</rscale>\n</mgrwt>\n<rwgt>\n\
             <wgt id='Coup-1p0'> 2.5e-01 </wgt>\n<wgt pid='x' id='1'> 2.0 </wgt>\n\
             <wgt id = \"Coup-0p1\" > 1.5D+00 </wgt>\n</rwgt>\n",
        )
        .unwrap();
        assert_eq!(
            weights,
            vec![
                ("Coup-1p0".to_string(), 0.25),
                ("1".to_string(), 2.0),
                ("Coup-0p1".to_string(), 1.5),
            ]
        );
        assert!(parse_weights("").unwrap().is_empty());
        assert!(parse_weights("<mgrwt></mgrwt>").unwrap().is_empty());
        assert!(parse_weights("<rwgt><wgt> 1.0 </wgt></rwgt>").is_err());
        assert!(parse_weights("<rwgt><wgt id='a'> 1.0 </rwgt>").is_err());
        assert!(parse_weights("<rwgt><wgt id='a'> nope </wgt></rwgt>").is_err());
    }

    #[test]
    fn test_fortran_exponents() {
        assert_eq!(parse_f64("1.5D+02"), Some(150.0));
        assert_eq!(parse_f64("-2.0d-01"), Some(-0.2));
        assert_eq!(parse_f64("x"), None);
    }
}
