use rusqlite::{params, OptionalExtension, Row as SqlRow};

use crate::error::{Result, ValidationError};
use crate::model::{ChartSetting, ChartSettingUpdate, NewChartSetting, Page, PageUpdate};
use crate::store::Store;

const CHART_COLUMNS: &str = "id, chart_key, title, x_label, y_label, unit, description, updated_at";
const PAGE_COLUMNS: &str = "id, slug, title, content, published, updated_at, created_at";

impl Store {
    pub fn chart_settings(&self) -> Result<Vec<ChartSetting>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHART_COLUMNS} FROM chart_settings ORDER BY id"
        ))?;
        let rows = stmt
            .query_map([], chart_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn chart_setting(&self, chart_key: &str) -> Result<Option<ChartSetting>> {
        let conn = self.connection()?;
        let setting = conn
            .query_row(
                &format!("SELECT {CHART_COLUMNS} FROM chart_settings WHERE chart_key = ?1"),
                [chart_key],
                chart_from_row,
            )
            .optional()?;
        Ok(setting)
    }

    /// Returns `false` when a setting with the same key already exists.
    pub fn insert_chart_setting(&self, setting: &NewChartSetting) -> Result<bool> {
        validate_title(&setting.fields.title)?;
        let conn = self.connection()?;
        let inserted = conn.execute(
            "INSERT INTO chart_settings (chart_key, title, x_label, y_label, unit, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(chart_key) DO NOTHING",
            params![
                setting.chart_key,
                setting.fields.title,
                setting.fields.x_label,
                setting.fields.y_label,
                setting.fields.unit,
                setting.fields.description
            ],
        )?;
        Ok(inserted > 0)
    }

    pub fn update_chart_setting(
        &self,
        id: i64,
        update: &ChartSettingUpdate,
    ) -> Result<Option<ChartSetting>> {
        validate_title(&update.title)?;
        let conn = self.connection()?;
        let changed = conn.execute(
            "UPDATE chart_settings
             SET title = ?1,
                 x_label = COALESCE(?2, x_label),
                 y_label = COALESCE(?3, y_label),
                 unit = COALESCE(?4, unit),
                 description = COALESCE(?5, description),
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?6",
            params![
                update.title,
                update.x_label,
                update.y_label,
                update.unit,
                update.description,
                id
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        let setting = conn.query_row(
            &format!("SELECT {CHART_COLUMNS} FROM chart_settings WHERE id = ?1"),
            [id],
            chart_from_row,
        )?;
        Ok(Some(setting))
    }

    pub fn pages(&self) -> Result<Vec<Page>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!("SELECT {PAGE_COLUMNS} FROM pages ORDER BY slug"))?;
        let rows = stmt
            .query_map([], page_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn published_page(&self, slug: &str) -> Result<Option<Page>> {
        let conn = self.connection()?;
        let page = conn
            .query_row(
                &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE slug = ?1 AND published = 1"),
                [slug],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    /// Returns `false` when a page with the same slug already exists.
    pub fn insert_page(&self, slug: &str, page: &PageUpdate) -> Result<bool> {
        validate_title(&page.title)?;
        let conn = self.connection()?;
        let inserted = conn.execute(
            "INSERT INTO pages (slug, title, content, published) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(slug) DO NOTHING",
            params![slug, page.title, page.content, page.published.unwrap_or(false)],
        )?;
        Ok(inserted > 0)
    }

    pub fn update_page(&self, id: i64, update: &PageUpdate) -> Result<Option<Page>> {
        validate_title(&update.title)?;
        let conn = self.connection()?;
        let changed = conn.execute(
            "UPDATE pages
             SET title = ?1,
                 content = COALESCE(?2, content),
                 published = COALESCE(?3, published),
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?4",
            params![update.title, update.content, update.published, id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        let page = conn.query_row(
            &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = ?1"),
            [id],
            page_from_row,
        )?;
        Ok(Some(page))
    }
}

fn validate_title(title: &str) -> std::result::Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::Invalid("title must not be empty".to_string()));
    }
    Ok(())
}

fn chart_from_row(row: &SqlRow<'_>) -> rusqlite::Result<ChartSetting> {
    Ok(ChartSetting {
        id: row.get(0)?,
        chart_key: row.get(1)?,
        title: row.get(2)?,
        x_label: row.get(3)?,
        y_label: row.get(4)?,
        unit: row.get(5)?,
        description: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn page_from_row(row: &SqlRow<'_>) -> rusqlite::Result<Page> {
    Ok(Page {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        published: row.get(4)?,
        updated_at: row.get(5)?,
        created_at: row.get(6)?,
    })
}
