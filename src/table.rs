use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub index_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub label: String,
    pub values: Vec<String>,
}

impl Table {
    // Short rows are padded; a row wider than the header is rejected.
    pub fn parse(text: &str) -> Result<Self, String> {
        if text.trim().is_empty() {
            return Err("response body is empty".to_string());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let header_record = reader.headers().map_err(|e| e.to_string())?.clone();
        let mut header = header_record.iter();
        let index_name = header
            .next()
            .ok_or_else(|| "no header row".to_string())?
            .to_string();
        let columns: Vec<String> = header.map(str::to_string).collect();
        let width = columns.len() + 1;

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| e.to_string())?;
            if record.len() > width {
                return Err(format!(
                    "expected {} fields in data row {}, saw {}",
                    width,
                    line + 1,
                    record.len()
                ));
            }

            let mut fields = record.iter().map(str::to_string);
            let label = fields.next().unwrap_or_default();
            let mut values: Vec<String> = fields.collect();
            values.resize(columns.len(), String::new());
            rows.push(Row { label, values });
        }

        Ok(Self {
            index_name,
            columns,
            rows,
        })
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record(std::iter::once(&self.index_name).chain(&self.columns))?;
        for row in &self.rows {
            writer.write_record(std::iter::once(&row.label).chain(&row.values))?;
        }

        writer.flush()?;
        Ok(())
    }
}
