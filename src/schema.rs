//! Static column metadata for each record collection. The query builder and
//! the generic record handler are driven entirely by these tables, so adding
//! an entity means adding a `Schema` here and binding a `RecordSet` to it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Email,
    Numeric,
    Uuid,
    Timestamp,
}

impl ColumnType {
    /// Cast suffix applied to bound parameters. All values are bound as text
    /// and cast server-side, which keeps binding uniform across types.
    pub fn cast(self) -> &'static str {
        match self {
            ColumnType::Text | ColumnType::Email => "",
            ColumnType::Numeric => "::numeric",
            ColumnType::Uuid => "::uuid",
            ColumnType::Timestamp => "::timestamptz",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub required: bool,
    pub writable: bool,
    pub hidden: bool,
    pub unique: bool,
    pub positive: bool,
}

impl Column {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Column {
            name,
            ty,
            required: false,
            writable: true,
            hidden: false,
            unique: false,
            positive: false,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn readonly(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Hidden columns are never serialized and cannot be filtered, sorted,
    /// or selected. They are also not writable through record input.
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self.writable = false;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn positive(mut self) -> Self {
        self.positive = true;
        self
    }
}

/// Relation-expansion directive: resolve a reference column to selected
/// attributes of the referenced record, embedded under `rel`.
#[derive(Debug, Clone, Copy)]
pub struct Expand {
    pub rel: &'static str,
    pub fk_column: &'static str,
    pub table: &'static str,
    pub fields: &'static [&'static str],
}

#[derive(Debug)]
pub struct Schema {
    pub table: &'static str,
    pub entity: &'static str,
    pub columns: &'static [Column],
    /// Collections of credential holders accept `password` and
    /// `password_confirm` input attributes; the hash lands in
    /// `password_hash`, which stays hidden.
    pub has_credentials: bool,
}

impl Schema {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn visible_column(&self, name: &str) -> Option<&Column> {
        self.column(name).filter(|c| !c.hidden)
    }

    /// The jsonb expression for a full document, with hidden columns
    /// stripped. `qualifier` is the row alias (or the bare table name in a
    /// RETURNING clause).
    pub fn full_doc_expr(&self, qualifier: &str) -> String {
        let mut expr = format!("to_jsonb({qualifier})");
        for col in self.columns.iter().filter(|c| c.hidden) {
            expr.push_str(&format!(" - '{}'", col.name));
        }
        expr
    }

    /// The jsonb expression for a projected document restricted to `fields`
    /// (already validated against this schema).
    pub fn projected_doc_expr(&self, qualifier: &str, fields: &[String]) -> String {
        let pairs: Vec<String> = fields
            .iter()
            .map(|f| format!("'{f}', {qualifier}.\"{f}\""))
            .collect();
        format!("jsonb_build_object({})", pairs.join(", "))
    }
}

pub static EMPLOYEE: Schema = Schema {
    table: "employees",
    entity: "Employee",
    has_credentials: true,
    columns: &[
        Column::new("id", ColumnType::Uuid).readonly(),
        Column::new("name", ColumnType::Text).required(),
        Column::new("email", ColumnType::Email).required().unique(),
        Column::new("salary", ColumnType::Numeric).required().positive(),
        Column::new("department_id", ColumnType::Uuid).required(),
        Column::new("password_hash", ColumnType::Text).hidden(),
        Column::new("password_changed_at", ColumnType::Timestamp).readonly(),
        Column::new("password_reset_code", ColumnType::Text).hidden(),
        Column::new("password_reset_expires", ColumnType::Timestamp).hidden(),
        Column::new("created_at", ColumnType::Timestamp).readonly(),
        Column::new("updated_at", ColumnType::Timestamp).readonly(),
    ],
};

pub static DEPARTMENT: Schema = Schema {
    table: "departments",
    entity: "Department",
    has_credentials: false,
    columns: &[
        Column::new("id", ColumnType::Uuid).readonly(),
        Column::new("name", ColumnType::Text).required(),
        Column::new("created_at", ColumnType::Timestamp).readonly(),
        Column::new("updated_at", ColumnType::Timestamp).readonly(),
    ],
};

pub static ADMIN: Schema = Schema {
    table: "admins",
    entity: "Admin",
    has_credentials: true,
    columns: &[
        Column::new("id", ColumnType::Uuid).readonly(),
        Column::new("name", ColumnType::Text).required(),
        Column::new("email", ColumnType::Email).required().unique(),
        Column::new("password_hash", ColumnType::Text).hidden(),
        Column::new("password_changed_at", ColumnType::Timestamp).readonly(),
        Column::new("password_reset_code", ColumnType::Text).hidden(),
        Column::new("password_reset_expires", ColumnType::Timestamp).hidden(),
        Column::new("created_at", ColumnType::Timestamp).readonly(),
        Column::new("updated_at", ColumnType::Timestamp).readonly(),
    ],
};

/// Employee -> Department expansion used by the employee list/get routes,
/// mirroring the department name lookup on employee reads.
pub static DEPARTMENT_NAME: Expand = Expand {
    rel: "department",
    fk_column: "department_id",
    table: "departments",
    fields: &["name"],
};
