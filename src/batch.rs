use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::FetchConfig;
use crate::error::{BatchError, WriteError};
use crate::fetch::TableSource;
use crate::index::{load_identifiers, Identifier};

pub fn request_url(base_url: &str, id: &Identifier) -> String {
    format!("{}{}", base_url, id)
}

pub fn output_path(output_dir: &Path, id: &Identifier, extension: &str) -> PathBuf {
    output_dir.join(format!("{}.{}", id, extension))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub identifier: Identifier,
    pub path: PathBuf,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record {} of {} completed", self.completed, self.total)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub written: Vec<PathBuf>,
}

pub struct BatchFetcher<S> {
    config: FetchConfig,
    source: S,
    dry_run: bool,
}

impl<S: TableSource> BatchFetcher<S> {
    pub fn new(config: FetchConfig, source: S, dry_run: bool) -> anyhow::Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            source,
            dry_run,
        })
    }

    pub fn run(&self) -> Result<BatchReport, BatchError> {
        self.run_with_progress(|progress| println!("{}", progress))
    }

    // Files written before a failure are left in place.
    pub fn run_with_progress<F>(&self, mut on_progress: F) -> Result<BatchReport, BatchError>
    where
        F: FnMut(&Progress),
    {
        log::info!("Starting batch from {:?}", self.config.input_path);

        let ids = load_identifiers(
            &self.config.input_path,
            &self.config.id_column,
            self.config.sheet.as_deref(),
        )?;
        let total = ids.len();

        if self.dry_run {
            for id in &ids {
                log::info!(
                    "DRY RUN: Would fetch {} into {:?}",
                    request_url(&self.config.base_url, id),
                    self.output_path(id)
                );
            }
            return Ok(BatchReport {
                total,
                written: Vec::new(),
            });
        }

        fs::create_dir_all(&self.config.output_dir).map_err(|source| WriteError::CreateDir {
            path: self.config.output_dir.clone(),
            source,
        })?;

        let mut report = BatchReport {
            total,
            written: Vec::with_capacity(total),
        };

        for (i, id) in ids.into_iter().enumerate() {
            let url = request_url(&self.config.base_url, &id);

            let table = match self.source.fetch_table(&url) {
                Ok(table) => table,
                Err(source) => {
                    return Err(BatchError::Fetch {
                        position: i + 1,
                        identifier: id,
                        source,
                    })
                }
            };

            let path = self.output_path(&id);
            table.write_csv(&path).map_err(|source| WriteError::File {
                path: path.clone(),
                source,
            })?;
            log::info!("Wrote {} rows for AID {} to {:?}", table.rows.len(), id, path);

            report.written.push(path.clone());
            on_progress(&Progress {
                completed: i + 1,
                total,
                identifier: id,
                path,
            });
        }

        log::info!("Batch completed: {} of {} records written", report.written.len(), total);
        Ok(report)
    }

    fn output_path(&self, id: &Identifier) -> PathBuf {
        output_path(&self.config.output_dir, id, &self.config.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, LoadError};
    use crate::table::Table;
    use std::cell::RefCell;

    const BASE: &str = "https://example.test/pcget.cgi?aid=";

    /// Serves a small table for every URL, failing on the `fail_at`-th call.
    struct ScriptedSource {
        requests: RefCell<Vec<String>>,
        fail_at: Option<usize>,
    }

    impl ScriptedSource {
        fn new(fail_at: Option<usize>) -> Self {
            Self {
                requests: RefCell::new(Vec::new()),
                fail_at,
            }
        }
    }

    impl TableSource for ScriptedSource {
        fn fetch_table(&self, url: &str) -> Result<Table, FetchError> {
            let mut requests = self.requests.borrow_mut();
            requests.push(url.to_string());
            if Some(requests.len()) == self.fail_at {
                return Err(FetchError::NotTabular {
                    url: url.to_string(),
                    reason: "response body is empty".to_string(),
                });
            }
            Ok(Table::parse(&format!("PUBCHEM_RESULT_TAG,url\n1,{}\n", url)).unwrap())
        }
    }

    struct Workspace {
        _dir: tempfile::TempDir,
        config: FetchConfig,
    }

    fn workspace(index: &str) -> Workspace {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("supplement.csv");
        fs::write(&input_path, index).unwrap();

        let config = FetchConfig {
            input_path,
            base_url: BASE.to_string(),
            output_dir: dir.path().join("raw"),
            ..FetchConfig::default()
        };
        Workspace { _dir: dir, config }
    }

    fn output_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn writes_one_file_per_identifier_and_reports_progress() {
        let ws = workspace("AID,Target\n1001,KCNQ2\n1002,hERG\n");
        let fetcher = BatchFetcher::new(ws.config.clone(), ScriptedSource::new(None), false).unwrap();

        let mut lines = Vec::new();
        let report = fetcher
            .run_with_progress(|p| lines.push(p.to_string()))
            .unwrap();

        assert_eq!(
            *fetcher.source.requests.borrow(),
            vec![format!("{}1001", BASE), format!("{}1002", BASE)]
        );
        assert_eq!(output_names(&ws.config.output_dir), vec!["1001.csv", "1002.csv"]);
        assert_eq!(lines, vec!["record 1 of 2 completed", "record 2 of 2 completed"]);
        assert_eq!(report.total, 2);
        assert_eq!(report.written.len(), lines.len());

        let written = fs::read_to_string(ws.config.output_dir.join("1002.csv")).unwrap();
        assert_eq!(written, format!("PUBCHEM_RESULT_TAG,url\n1,{}1002\n", BASE));
    }

    #[test]
    fn missing_column_makes_no_requests() {
        let ws = workspace("CID,Target\n1001,KCNQ2\n");
        let fetcher = BatchFetcher::new(ws.config.clone(), ScriptedSource::new(None), false).unwrap();

        let err = fetcher.run_with_progress(|_| {}).unwrap_err();

        assert!(matches!(err, BatchError::Load(LoadError::ColumnMissing { .. })));
        assert!(fetcher.source.requests.borrow().is_empty());
        assert!(!ws.config.output_dir.exists());
    }

    #[test]
    fn failure_stops_the_batch_and_keeps_earlier_files() {
        let ws = workspace("AID\n11\n12\n13\n14\n");
        let fetcher = BatchFetcher::new(ws.config.clone(), ScriptedSource::new(Some(3)), false).unwrap();

        let mut progress = 0;
        let err = fetcher.run_with_progress(|_| progress += 1).unwrap_err();

        match err {
            BatchError::Fetch {
                position,
                identifier,
                ..
            } => {
                assert_eq!(position, 3);
                assert_eq!(identifier.as_str(), "13");
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
        assert_eq!(progress, 2);
        assert_eq!(fetcher.source.requests.borrow().len(), 3);
        assert_eq!(output_names(&ws.config.output_dir), vec!["11.csv", "12.csv"]);
    }

    #[test]
    fn rerun_overwrites_existing_outputs() {
        let ws = workspace("AID\n1001\n");
        fs::create_dir_all(&ws.config.output_dir).unwrap();
        fs::write(ws.config.output_dir.join("1001.csv"), "old contents\n").unwrap();

        for _ in 0..2 {
            let fetcher =
                BatchFetcher::new(ws.config.clone(), ScriptedSource::new(None), false).unwrap();
            fetcher.run_with_progress(|_| {}).unwrap();
        }

        assert_eq!(output_names(&ws.config.output_dir), vec!["1001.csv"]);
        let written = fs::read_to_string(ws.config.output_dir.join("1001.csv")).unwrap();
        assert!(written.starts_with("PUBCHEM_RESULT_TAG,url\n"));
    }

    #[test]
    fn duplicate_identifiers_are_fetched_twice() {
        let ws = workspace("AID\n7\n7\n");
        let fetcher = BatchFetcher::new(ws.config.clone(), ScriptedSource::new(None), false).unwrap();

        let report = fetcher.run_with_progress(|_| {}).unwrap();

        assert_eq!(fetcher.source.requests.borrow().len(), 2);
        assert_eq!(report.written.len(), 2);
        assert_eq!(output_names(&ws.config.output_dir), vec!["7.csv"]);
    }

    #[test]
    fn unusable_output_dir_fails_before_any_request() {
        let mut ws = workspace("AID\n1001\n");
        let blocker = ws.config.input_path.with_file_name("not-a-dir");
        fs::write(&blocker, "").unwrap();
        ws.config.output_dir = blocker;
        let fetcher = BatchFetcher::new(ws.config.clone(), ScriptedSource::new(None), false).unwrap();

        let err = fetcher.run_with_progress(|_| {}).unwrap_err();

        assert!(matches!(err, BatchError::Write(WriteError::CreateDir { .. })));
        assert!(fetcher.source.requests.borrow().is_empty());
    }

    #[test]
    fn unwritable_target_stops_the_batch() {
        let ws = workspace("AID\n1001\n1002\n1003\n");
        fs::create_dir_all(ws.config.output_dir.join("1002.csv")).unwrap();
        let fetcher = BatchFetcher::new(ws.config.clone(), ScriptedSource::new(None), false).unwrap();

        let mut progress = 0;
        let err = fetcher.run_with_progress(|_| progress += 1).unwrap_err();

        match err {
            BatchError::Write(WriteError::File { path, .. }) => {
                assert_eq!(path, ws.config.output_dir.join("1002.csv"));
            }
            other => panic!("expected write error, got {other:?}"),
        }
        assert_eq!(progress, 1);
        assert_eq!(fetcher.source.requests.borrow().len(), 2);
        assert!(ws.config.output_dir.join("1002.csv").is_dir());
        assert_eq!(output_names(&ws.config.output_dir), vec!["1001.csv", "1002.csv"]);
    }

    #[test]
    fn dry_run_touches_nothing() {
        let ws = workspace("AID\n1001\n1002\n");
        let fetcher = BatchFetcher::new(ws.config.clone(), ScriptedSource::new(None), true).unwrap();

        let report = fetcher.run_with_progress(|_| panic!("no progress in a dry run")).unwrap();

        assert_eq!(report.total, 2);
        assert!(report.written.is_empty());
        assert!(fetcher.source.requests.borrow().is_empty());
        assert!(!ws.config.output_dir.exists());
    }

    #[test]
    fn configured_extension_names_the_outputs() {
        let mut ws = workspace("AID\n1001\n");
        ws.config.extension = "tsv".to_string();
        let fetcher = BatchFetcher::new(ws.config.clone(), ScriptedSource::new(None), false).unwrap();

        fetcher.run_with_progress(|_| {}).unwrap();

        assert_eq!(output_names(&ws.config.output_dir), vec!["1001.tsv"]);
    }

    #[test]
    fn url_and_path_are_plain_concatenation() {
        let id = Identifier::new("1259381");
        assert_eq!(
            request_url(".../aid=", &id),
            ".../aid=1259381"
        );
        assert_eq!(
            output_path(Path::new("raw"), &id, "csv"),
            Path::new("raw").join("1259381.csv")
        );
    }
}
