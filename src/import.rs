use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Result, SalesError};
use crate::models::{ImportLogEntry, ProductEntry, SaleRecord, StoredSale};
use crate::parser::{decode_latin1, parse, prescan};
use crate::period::Period;
use crate::settings::Settings;
use crate::store::{ProductCatalog, RecordStore, SaleFilter};

const AUTO_REGISTER_DESCRIPTION: &str = "Imported automatically from CSV";

// ---------------------------------------------------------------------------
// Batch input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ImportEntry {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Files of one user-initiated upload, in the order they were given.
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub entries: Vec<ImportEntry>,
}

impl ImportBatch {
    pub fn push(&mut self, filename: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.push(ImportEntry {
            filename: filename.into(),
            bytes: bytes.into(),
        });
    }

    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut batch = Self::default();
        for path in paths {
            let path = path.as_ref();
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            batch.push(filename, std::fs::read(path)?);
        }
        Ok(batch)
    }
}

fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Pre-scan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Resolved(Period),
    /// No non-blank lines; nothing to import and no period claimed.
    Empty,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ScanEntry {
    pub filename: String,
    pub outcome: ScanOutcome,
}

/// Two or more files of the batch resolving to the same period. The last one
/// listed is the one that gets imported.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub period: Period,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub entries: Vec<ScanEntry>,
    pub collisions: Vec<Collision>,
}

impl ScanReport {
    /// Period -> filename that will supply it.
    pub fn assignment(&self) -> BTreeMap<Period, &str> {
        let mut map = BTreeMap::new();
        for entry in &self.entries {
            if let ScanOutcome::Resolved(period) = entry.outcome {
                map.insert(period, entry.filename.as_str());
            }
        }
        map
    }

    pub fn has_collisions(&self) -> bool {
        !self.collisions.is_empty()
    }

    pub fn importable(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, ScanOutcome::Resolved(_)))
            .count()
    }
}

pub fn scan_batch(batch: &ImportBatch) -> ScanReport {
    let mut claims: BTreeMap<Period, Vec<String>> = BTreeMap::new();
    let entries: Vec<ScanEntry> = batch
        .entries
        .iter()
        .map(|entry| {
            let content = decode_latin1(&entry.bytes);
            let outcome = match prescan(&content, &entry.filename) {
                Ok(Some(period)) => {
                    claims.entry(period).or_default().push(entry.filename.clone());
                    ScanOutcome::Resolved(period)
                }
                Ok(None) => ScanOutcome::Empty,
                Err(e) => ScanOutcome::Failed(e.to_string()),
            };
            ScanEntry {
                filename: entry.filename.clone(),
                outcome,
            }
        })
        .collect();

    let collisions = claims
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|(period, files)| Collision { period, files })
        .collect();

    ScanReport { entries, collisions }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportState {
    Idle,
    Scanning,
    AwaitingConfirmation,
    Importing,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportTarget {
    pub client_id: i64,
    pub year: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportConfig {
    /// Rows per insert call.
    pub insert_chunk_size: usize,
    /// Codes per catalog lookup/insert call.
    pub catalog_batch_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            insert_chunk_size: 500,
            catalog_batch_size: 200,
        }
    }
}

impl From<&Settings> for ImportConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            insert_chunk_size: settings.insert_chunk_size.max(1),
            catalog_batch_size: settings.catalog_batch_size.max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub filename: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub total_value: f64,
    pub files_imported: usize,
    pub failed_files: Vec<FileFailure>,
    /// Files whose period was taken over by a later file in the batch.
    pub superseded_files: Vec<String>,
    pub periods: Vec<Period>,
    pub new_products: usize,
}

struct FilePlan {
    filename: String,
    checksum: String,
    records: Vec<SaleRecord>,
}

struct PendingImport {
    batch: ImportBatch,
    report: ScanReport,
}

/// Drives one batch through scan -> confirmation -> import. A new scan is
/// refused while a batch is waiting for confirmation or being imported.
pub struct ImportOrchestrator {
    target: ImportTarget,
    config: ImportConfig,
    state: ImportState,
    pending: Option<PendingImport>,
}

impl ImportOrchestrator {
    pub fn new(target: ImportTarget, config: ImportConfig) -> Self {
        Self {
            target,
            config,
            state: ImportState::Idle,
            pending: None,
        }
    }

    pub fn state(&self) -> ImportState {
        self.state
    }

    pub fn report(&self) -> Option<&ScanReport> {
        self.pending.as_ref().map(|p| &p.report)
    }

    pub fn scan(&mut self, batch: ImportBatch) -> Result<&ScanReport> {
        if matches!(
            self.state,
            ImportState::Scanning | ImportState::AwaitingConfirmation | ImportState::Importing
        ) {
            return Err(SalesError::ImportInProgress);
        }
        self.state = ImportState::Scanning;
        let report = scan_batch(&batch);
        tracing::debug!(
            files = report.entries.len(),
            collisions = report.collisions.len(),
            "scanned import batch"
        );
        self.state = ImportState::AwaitingConfirmation;
        Ok(&self.pending.insert(PendingImport { batch, report }).report)
    }

    /// Drop the scanned batch. Nothing has been written at this point.
    pub fn cancel(&mut self) -> Result<()> {
        if self.state != ImportState::AwaitingConfirmation {
            return Err(SalesError::InvalidState(format!(
                "nothing to cancel while {:?}",
                self.state
            )));
        }
        self.pending = None;
        self.state = ImportState::Idle;
        Ok(())
    }

    pub fn confirm<S>(&mut self, store: &mut S) -> Result<ImportSummary>
    where
        S: RecordStore + ProductCatalog,
    {
        if self.state != ImportState::AwaitingConfirmation {
            return Err(SalesError::InvalidState(format!(
                "cannot confirm an import while {:?}",
                self.state
            )));
        }
        let Some(pending) = self.pending.take() else {
            return Err(SalesError::InvalidState("no scanned batch".to_string()));
        };
        self.state = ImportState::Importing;
        match run_import(&pending, self.target, &self.config, store) {
            Ok(summary) => {
                self.state = ImportState::Done;
                Ok(summary)
            }
            Err(e) => {
                self.state = ImportState::Failed;
                Err(e)
            }
        }
    }
}

fn run_import<S>(
    pending: &PendingImport,
    target: ImportTarget,
    config: &ImportConfig,
    store: &mut S,
) -> Result<ImportSummary>
where
    S: RecordStore + ProductCatalog,
{
    let mut summary = ImportSummary::default();

    // Phase 1: parse, later files replacing earlier ones for the same period.
    let mut plan: BTreeMap<Period, FilePlan> = BTreeMap::new();
    for (entry, scanned) in pending.batch.entries.iter().zip(&pending.report.entries) {
        if let ScanOutcome::Failed(message) = &scanned.outcome {
            summary.failed_files.push(FileFailure {
                filename: entry.filename.clone(),
                message: message.clone(),
            });
            continue;
        }
        let content = decode_latin1(&entry.bytes);
        let parsed = match parse(&content, &entry.filename) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(filename = %entry.filename, error = %e, "skipping file");
                summary.failed_files.push(FileFailure {
                    filename: entry.filename.clone(),
                    message: e.to_string(),
                });
                continue;
            }
        };
        let Some(period) = parsed.period else {
            continue;
        };
        let file = FilePlan {
            filename: entry.filename.clone(),
            checksum: checksum(&entry.bytes),
            records: parsed.records,
        };
        if let Some(previous) = plan.insert(period, file) {
            summary.superseded_files.push(previous.filename);
        }
    }

    // Phase 2: the replace plan.
    let periods: Vec<Period> = plan.keys().copied().collect();
    let sales: Vec<StoredSale> = plan
        .values()
        .flat_map(|file| {
            file.records.iter().map(|record| StoredSale {
                client_id: target.client_id,
                year: target.year,
                source_file: file.filename.clone(),
                record: record.clone(),
            })
        })
        .collect();
    summary.periods = periods.clone();
    summary.files_imported = plan.len();
    summary.imported = sales.len();
    summary.total_value = sales.iter().map(|s| s.record.value).sum();

    if periods.is_empty() {
        return Ok(summary);
    }

    summary.new_products = register_products(
        store,
        sales.iter().map(|s| &s.record),
        config.catalog_batch_size,
    );

    // Phase 3: delete every target period, then insert everything.
    let chunk_size = config.insert_chunk_size.max(1);
    store
        .atomically(|s| {
            s.ensure_year(target.client_id, target.year)?;
            for period in &periods {
                let filter = SaleFilter::for_year(target.client_id, target.year).with_period(*period);
                let removed = s.delete_sales(&filter)?;
                tracing::debug!(period = %period, removed, "cleared period before import");
            }
            for chunk in sales.chunks(chunk_size) {
                s.insert_sales(chunk)?;
            }
            Ok(())
        })
        .map_err(|e| SalesError::StoreFailure(e.to_string()))?;

    for (period, file) in &plan {
        let entry = ImportLogEntry {
            client_id: target.client_id,
            year: target.year,
            filename: file.filename.clone(),
            period: *period,
            record_count: file.records.len() as i64,
            checksum: file.checksum.clone(),
            imported_at: None,
        };
        if let Err(e) = store.log_import(&entry) {
            tracing::warn!(filename = %file.filename, error = %e, "could not record import");
        }
    }

    tracing::info!(
        client_id = target.client_id,
        year = target.year,
        records = summary.imported,
        files = summary.files_imported,
        "import committed"
    );
    Ok(summary)
}

/// Register product codes the catalog does not know yet. Best-effort: any
/// failure is logged and the import carries on. Returns how many were added.
fn register_products<'a, C, I>(catalog: &mut C, records: I, batch_size: usize) -> usize
where
    C: ProductCatalog,
    I: IntoIterator<Item = &'a SaleRecord>,
{
    // A real name beats a name that merely repeats the code.
    let mut names: BTreeMap<&str, &str> = BTreeMap::new();
    for record in records {
        let code = record.product_code.as_str();
        let name = record.product_name.as_str();
        match names.get(code) {
            Some(current) if *current != code || name == code => {}
            _ => {
                names.insert(code, name);
            }
        }
    }
    if names.is_empty() {
        return 0;
    }

    let batch_size = batch_size.max(1);
    let codes: Vec<String> = names.keys().map(|c| c.to_string()).collect();
    let mut existing: HashSet<String> = HashSet::new();
    for batch in codes.chunks(batch_size) {
        match catalog.lookup_existing(batch) {
            Ok(found) => existing.extend(found),
            Err(e) => {
                tracing::warn!(error = %e, "product lookup failed, skipping auto-registration");
                return 0;
            }
        }
    }

    let new_entries: Vec<ProductEntry> = names
        .iter()
        .filter(|(code, _)| !existing.contains(**code))
        .map(|(code, name)| ProductEntry {
            code: code.to_string(),
            name: name.to_string(),
            description: AUTO_REGISTER_DESCRIPTION.to_string(),
        })
        .collect();

    let mut registered = 0;
    for batch in new_entries.chunks(batch_size) {
        match catalog.insert_new(batch) {
            Ok(()) => registered += batch.len(),
            Err(e) => tracing::warn!(error = %e, "could not register products"),
        }
    }
    if registered > 0 {
        tracing::info!(registered, "auto-registered new products");
    }
    registered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    /// Non-transactional store used to exercise failure paths.
    #[derive(Default)]
    struct MemoryStore {
        sales: Vec<StoredSale>,
        years: Vec<(i64, i32)>,
        products: Vec<ProductEntry>,
        log: Vec<ImportLogEntry>,
        insert_calls: usize,
        fail_on_insert_call: Option<usize>,
        fail_catalog: bool,
    }

    impl RecordStore for MemoryStore {
        fn insert_sales(&mut self, rows: &[StoredSale]) -> Result<()> {
            self.insert_calls += 1;
            if self.fail_on_insert_call == Some(self.insert_calls) {
                return Err(SalesError::Other("payload rejected".to_string()));
            }
            self.sales.extend_from_slice(rows);
            Ok(())
        }

        fn delete_sales(&mut self, filter: &SaleFilter) -> Result<usize> {
            let before = self.sales.len();
            self.sales.retain(|s| {
                !(filter.client_id.map_or(true, |c| c == s.client_id)
                    && filter.year.map_or(true, |y| y == s.year)
                    && filter.period.map_or(true, |p| p == s.record.period))
            });
            Ok(before - self.sales.len())
        }

        fn query_sales(&self, filter: &SaleFilter) -> Result<Vec<StoredSale>> {
            Ok(self
                .sales
                .iter()
                .filter(|s| {
                    filter.client_id.map_or(true, |c| c == s.client_id)
                        && filter.year.map_or(true, |y| y == s.year)
                        && filter.period.map_or(true, |p| p == s.record.period)
                })
                .cloned()
                .collect())
        }

        fn ensure_year(&mut self, client_id: i64, year: i32) -> Result<()> {
            if !self.years.contains(&(client_id, year)) {
                self.years.push((client_id, year));
            }
            Ok(())
        }

        fn log_import(&mut self, entry: &ImportLogEntry) -> Result<()> {
            self.log.push(entry.clone());
            Ok(())
        }
    }

    impl ProductCatalog for MemoryStore {
        fn lookup_existing(&self, codes: &[String]) -> Result<Vec<String>> {
            if self.fail_catalog {
                return Err(SalesError::Other("catalog offline".to_string()));
            }
            Ok(self
                .products
                .iter()
                .filter(|p| codes.contains(&p.code))
                .map(|p| p.code.clone())
                .collect())
        }

        fn insert_new(&mut self, entries: &[ProductEntry]) -> Result<()> {
            self.products.extend_from_slice(entries);
            Ok(())
        }
    }

    const TARGET: ImportTarget = ImportTarget {
        client_id: 1,
        year: 2024,
    };

    fn orchestrator() -> ImportOrchestrator {
        ImportOrchestrator::new(TARGET, ImportConfig::default())
    }

    fn batch(files: &[(&str, &str)]) -> ImportBatch {
        let mut batch = ImportBatch::default();
        for (name, content) in files {
            batch.push(*name, content.as_bytes());
        }
        batch
    }

    fn stored_codes(store: &MemoryStore, period: Period) -> Vec<String> {
        let mut codes: Vec<String> = store
            .query_sales(&SaleFilter::for_year(1, 2024).with_period(period))
            .unwrap()
            .into_iter()
            .map(|s| s.record.product_code)
            .collect();
        codes.sort();
        codes
    }

    #[test]
    fn test_scan_reports_one_collision_naming_both_files() {
        let mut orch = orchestrator();
        let report = orch
            .scan(batch(&[
                ("vendas 03.csv", "codigo;qtd\nA;1\n"),
                ("marco_03.csv", "codigo;qtd\nB;2\n"),
                ("vendas 04.csv", "codigo;qtd\nC;1\n"),
            ]))
            .unwrap();
        assert_eq!(
            report.collisions,
            vec![Collision {
                period: Period::Month(3),
                files: vec!["vendas 03.csv".to_string(), "marco_03.csv".to_string()],
            }]
        );
        assert_eq!(report.assignment()[&Period::Month(3)], "marco_03.csv");
        assert_eq!(orch.state(), ImportState::AwaitingConfirmation);
    }

    #[test]
    fn test_scan_records_header_failures_and_empty_files() {
        let report = scan_batch(&batch(&[
            ("vendas 01.csv", "data;valor\nx;1\n"),
            ("vendas 02.csv", "\n\n"),
            ("vendas 03.csv", "codigo;qtd\nA;1\n"),
        ]));
        assert!(matches!(report.entries[0].outcome, ScanOutcome::Failed(_)));
        assert_eq!(report.entries[1].outcome, ScanOutcome::Empty);
        assert_eq!(report.entries[2].outcome, ScanOutcome::Resolved(Period::Month(3)));
        assert_eq!(report.importable(), 1);
        assert!(!report.has_collisions());
    }

    #[test]
    fn test_collision_last_file_wins() {
        let mut store = MemoryStore::default();
        let mut orch = orchestrator();
        orch.scan(batch(&[
            ("vendas 03.csv", "codigo;qtd\nA;1\n"),
            ("loja_03.csv", "codigo;qtd\nB;2\nC;5\n"),
        ]))
        .unwrap();
        let summary = orch.confirm(&mut store).unwrap();
        assert_eq!(stored_codes(&store, Period::Month(3)), vec!["B", "C"]);
        assert_eq!(summary.superseded_files, vec!["vendas 03.csv"]);
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.files_imported, 1);
        assert_eq!(orch.state(), ImportState::Done);
    }

    #[test]
    fn test_reimport_replaces_instead_of_duplicating() {
        let mut store = MemoryStore::default();
        let files = [("vendas 05.csv", "codigo;qtd\nA1;3\nA2;4\n")];
        for _ in 0..2 {
            let mut orch = orchestrator();
            orch.scan(batch(&files)).unwrap();
            orch.confirm(&mut store).unwrap();
        }
        assert_eq!(stored_codes(&store, Period::Month(5)), vec!["A1", "A2"]);
        assert_eq!(store.sales.len(), 2);
    }

    #[test]
    fn test_import_leaves_other_periods_alone() {
        let mut store = MemoryStore::default();
        let mut orch = orchestrator();
        orch.scan(batch(&[("vendas 01.csv", "codigo;qtd\nOLD;9\n")])).unwrap();
        orch.confirm(&mut store).unwrap();

        orch.scan(batch(&[("vendas 02.csv", "codigo;qtd\nNEW;1\n")])).unwrap();
        orch.confirm(&mut store).unwrap();
        assert_eq!(stored_codes(&store, Period::Month(1)), vec!["OLD"]);
        assert_eq!(stored_codes(&store, Period::Month(2)), vec!["NEW"]);
        assert_eq!(store.years, vec![(1, 2024)]);
    }

    #[test]
    fn test_failed_file_is_skipped_and_batch_continues() {
        let mut store = MemoryStore::default();
        let mut orch = orchestrator();
        orch.scan(batch(&[
            ("vendas 01.csv", "sem;colunas\n1;2\n"),
            ("vendas 02.csv", "codigo;qtd\nA;1\n"),
        ]))
        .unwrap();
        let summary = orch.confirm(&mut store).unwrap();
        assert_eq!(summary.failed_files.len(), 1);
        assert_eq!(summary.failed_files[0].filename, "vendas 01.csv");
        assert_eq!(summary.periods, vec![Period::Month(2)]);
        assert_eq!(store.log.len(), 1);
    }

    #[test]
    fn test_scan_refused_while_awaiting_confirmation() {
        let mut orch = orchestrator();
        orch.scan(batch(&[("vendas 01.csv", "codigo;qtd\nA;1\n")])).unwrap();
        let err = orch.scan(batch(&[("vendas 02.csv", "codigo;qtd\nA;1\n")])).unwrap_err();
        assert!(matches!(err, SalesError::ImportInProgress));
    }

    #[test]
    fn test_cancel_writes_nothing() {
        let mut store = MemoryStore::default();
        let mut orch = orchestrator();
        orch.scan(batch(&[("vendas 01.csv", "codigo;qtd\nA;1\n")])).unwrap();
        orch.cancel().unwrap();
        assert_eq!(orch.state(), ImportState::Idle);
        assert!(orch.report().is_none());
        assert!(matches!(
            orch.confirm(&mut store),
            Err(SalesError::InvalidState(_))
        ));
        assert!(store.sales.is_empty());
        assert!(orch.cancel().is_err());
    }

    #[test]
    fn test_catalog_failure_does_not_block_import() {
        let mut store = MemoryStore {
            fail_catalog: true,
            ..Default::default()
        };
        let mut orch = orchestrator();
        orch.scan(batch(&[("vendas 01.csv", "codigo;qtd\nA;1\n")])).unwrap();
        let summary = orch.confirm(&mut store).unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.new_products, 0);
    }

    #[test]
    fn test_registers_only_unknown_products_with_best_name() {
        let mut store = MemoryStore::default();
        store.products.push(ProductEntry {
            code: "A".to_string(),
            name: "Known".to_string(),
            description: String::new(),
        });
        let mut orch = orchestrator();
        orch.scan(batch(&[
            ("vendas 01.csv", "codigo;qtd\nA;1\nB;1\n"),
            ("vendas 02.csv", "codigo;descricao;qtd\nB;Selador;2\n"),
        ]))
        .unwrap();
        let summary = orch.confirm(&mut store).unwrap();
        assert_eq!(summary.new_products, 1);
        let b = store.products.iter().find(|p| p.code == "B").unwrap();
        assert_eq!(b.name, "Selador");
        assert_eq!(b.description, AUTO_REGISTER_DESCRIPTION);
    }

    #[test]
    fn test_inserts_in_chunks_and_store_failure_is_batch_fatal() {
        let mut store = MemoryStore {
            fail_on_insert_call: Some(2),
            ..Default::default()
        };
        store.sales.push(StoredSale {
            client_id: 1,
            year: 2024,
            source_file: "old.csv".to_string(),
            record: SaleRecord {
                product_code: "OLD".to_string(),
                product_name: "OLD".to_string(),
                quantity: 1,
                value: 0.0,
                period: Period::Month(6),
            },
        });
        let mut orch = ImportOrchestrator::new(
            TARGET,
            ImportConfig {
                insert_chunk_size: 2,
                catalog_batch_size: 200,
            },
        );
        orch.scan(batch(&[("vendas 06.csv", "codigo;qtd\nA;1\nB;1\nC;1\n")])).unwrap();
        let err = orch.confirm(&mut store).unwrap_err();
        assert!(matches!(err, SalesError::StoreFailure(_)));
        assert_eq!(orch.state(), ImportState::Failed);
        // Without a transactional store the replaced month is left partially
        // written: the old row is gone and only the first chunk landed.
        assert_eq!(stored_codes(&store, Period::Month(6)), vec!["A", "B"]);
        assert!(store.log.is_empty());
    }

    #[test]
    fn test_sqlite_store_failure_rolls_back_replaced_month() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::open(&dir.path().join("test.db")).unwrap();
        let client_id = store.add_client("Loja").unwrap();
        let target = ImportTarget { client_id, year: 2024 };

        let mut orch = ImportOrchestrator::new(target, ImportConfig::default());
        orch.scan(batch(&[("vendas 06.csv", "codigo;qtd\nOLD;4\n")])).unwrap();
        orch.confirm(&mut store).unwrap();

        store
            .connection()
            .execute_batch(
                "CREATE TRIGGER reject_boom BEFORE INSERT ON sales \
                 WHEN NEW.product_code = 'BOOM' BEGIN SELECT RAISE(ABORT, 'boom'); END;",
            )
            .unwrap();
        orch.scan(batch(&[("vendas 06.csv", "codigo;qtd\nNEW;1\nBOOM;1\n")])).unwrap();
        let err = orch.confirm(&mut store).unwrap_err();
        assert!(matches!(err, SalesError::StoreFailure(_)));

        let rows = store
            .query_sales(&SaleFilter::for_year(client_id, 2024).with_period(Period::Month(6)))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.product_code, "OLD");
        assert_eq!(rows[0].record.quantity, 4);
    }

    #[test]
    fn test_scan_allowed_again_after_failure() {
        let mut store = MemoryStore {
            fail_on_insert_call: Some(1),
            ..Default::default()
        };
        let mut orch = orchestrator();
        orch.scan(batch(&[("vendas 01.csv", "codigo;qtd\nA;1\n")])).unwrap();
        assert!(orch.confirm(&mut store).is_err());
        assert!(orch.scan(batch(&[("vendas 01.csv", "codigo;qtd\nA;1\n")])).is_ok());
    }

    #[test]
    fn test_latin1_bytes_are_decoded() {
        let mut store = MemoryStore::default();
        let mut orch = orchestrator();
        let mut b = ImportBatch::default();
        b.push("vendas 08.csv", b"C\xf3digo;Descri\xe7\xe3o;Qtd\nT1;Esmalte Sint\xe9tico;2\n".to_vec());
        orch.scan(b).unwrap();
        orch.confirm(&mut store).unwrap();
        assert_eq!(store.products[0].name, "Esmalte Sintético");
    }
}
