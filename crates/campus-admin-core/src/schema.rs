//! Per-entity schema descriptors
//!
//! Every entity the dashboard manages is described once here. The list,
//! detail, form and delete views are generic over [`EntitySchema`].

use crate::{Error, Result, record::RecordId};

/// How a field is edited and encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line text
    Text,
    /// Multi-line text
    LongText,
    /// `YYYY-MM-DD` date input
    Date,
    /// Numeric input, sent as a JSON number when it parses
    Number,
    /// Checkbox
    Boolean,
    /// Fixed choice list
    Select(&'static [SelectOption]),
    /// Array of strings edited as comma-separated text
    CommaList,
    /// Repeatable `{title, content[]}` groups
    ModuleGroups,
    /// File upload
    Image {
        /// Whether a file must be attached when creating
        required_on_create: bool,
    },
}

impl FieldKind {
    /// Whether the field carries a file upload
    pub const fn is_upload(self) -> bool {
        matches!(self, Self::Image { .. })
    }
}

/// One `<option>` of a select field or category filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOption {
    /// Submitted value
    pub value: &'static str,
    /// Visible label
    pub label: &'static str,
}

impl SelectOption {
    const fn new(value: &'static str, label: &'static str) -> Self {
        Self { value, label }
    }
}

/// One field of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// JSON key on the backend
    pub name: &'static str,
    /// Human label
    pub label: &'static str,
    /// Editing and encoding kind
    pub kind: FieldKind,
    /// Rendered with the `required` attribute
    pub required: bool,
    /// Shown on detail pages but never submitted
    pub read_only: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            read_only: false,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Whether the field appears in add/edit forms
    pub const fn editable(&self) -> bool {
        !self.read_only
    }
}

/// Where the detail view gets its record from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailSource {
    /// `GET` on this endpoint template
    Remote(&'static str),
    /// Looked up in the last fetched list
    CachedList,
    /// No detail page
    Unavailable,
}

/// Backend endpoint templates; `{id}` is substituted per record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    /// Collection endpoint
    pub list: &'static str,
    /// Detail source
    pub detail: DetailSource,
    /// Create endpoint (POST)
    pub create: Option<&'static str>,
    /// Update endpoint (PUT)
    pub update: Option<&'static str>,
    /// Delete endpoint (DELETE)
    pub delete: Option<&'static str>,
}

/// Options of a category filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryOptions {
    /// Fixed list
    Static(&'static [SelectOption]),
    /// Distinct non-empty values of the field in the current collection
    Derived,
}

/// Equality filter on one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySpec {
    /// Field compared against the selection
    pub field: &'static str,
    /// Label of the select box
    pub label: &'static str,
    /// Available options
    pub options: CategoryOptions,
    /// Query parameter forwarded to the list endpoint, if the backend filters too
    pub server_param: Option<&'static str>,
}

/// Descriptor of one managed entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySchema {
    /// URL slug, e.g. `admission-leads`
    pub slug: &'static str,
    /// Singular label, e.g. `Admission Lead`
    pub singular: &'static str,
    /// Plural label, e.g. `Admission Leads`
    pub plural: &'static str,
    /// Backend endpoints
    pub endpoints: Endpoints,
    /// All known fields in display order
    pub fields: &'static [FieldSpec],
    /// Fields shown as table columns
    pub columns: &'static [&'static str],
    /// Fields the search box matches against
    pub search_fields: &'static [&'static str],
    /// Optional category filter
    pub category: Option<CategorySpec>,
    /// Empty-state hint when no filter is active
    pub idle_hint: &'static str,
}

impl EntitySchema {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields shown in add/edit forms
    pub fn form_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.editable())
    }

    /// Whether any form field is a file upload
    pub fn has_uploads(&self) -> bool {
        self.form_fields().any(|f| f.kind.is_upload())
    }

    /// Entities can be created when a create endpoint exists
    pub const fn can_create(&self) -> bool {
        self.endpoints.create.is_some()
    }

    /// Entities can be edited when an update endpoint exists
    pub const fn can_edit(&self) -> bool {
        self.endpoints.update.is_some()
    }

    /// Entities can be deleted when a delete endpoint exists
    pub const fn can_delete(&self) -> bool {
        self.endpoints.delete.is_some()
    }

    /// Whether a detail page exists
    pub const fn has_detail(&self) -> bool {
        !matches!(self.endpoints.detail, DetailSource::Unavailable)
    }

    /// Dashboard path of the list view
    pub fn list_path(&self) -> String {
        format!("/{}", self.slug)
    }

    /// Dashboard path of one record's detail view
    pub fn detail_path(&self, id: &RecordId) -> String {
        format!("/{}/{}", self.slug, encode_id(id))
    }

    /// Where to go after a successful create or update
    ///
    /// Entities without a detail page, or responses without an id, go back
    /// to the list.
    pub fn after_submit_path(&self, id: Option<&RecordId>) -> String {
        match id {
            Some(id) if self.has_detail() => self.detail_path(id),
            _ => self.list_path(),
        }
    }

    /// Empty-state title, e.g. `No admission leads found`
    pub fn empty_title(&self) -> String {
        format!("No {} found", self.plural.to_lowercase())
    }

    /// Empty-state hint, depending on whether a search or category is active
    pub const fn empty_hint(&self, filtered: bool) -> &'static str {
        if filtered {
            "Try adjusting your search or filter"
        } else {
            self.idle_hint
        }
    }

    /// Backend path for the list, with the server-side category if any
    pub fn list_endpoint(&self, category: Option<&str>) -> String {
        match (self.category.and_then(|c| c.server_param), category) {
            (Some(param), Some(value)) if !value.is_empty() => format!(
                "{}?{}={}",
                self.endpoints.list,
                param,
                urlencoding::encode(value)
            ),
            _ => self.endpoints.list.to_string(),
        }
    }

    /// Backend path for a detail fetch
    pub fn detail_endpoint(&self, id: &RecordId) -> Result<String> {
        match self.endpoints.detail {
            DetailSource::Remote(template) => Ok(resolve(template, id)),
            _ => Err(self.unsupported("detail")),
        }
    }

    /// Backend path for a create
    pub fn create_endpoint(&self) -> Result<&'static str> {
        self.endpoints.create.ok_or_else(|| self.unsupported("create"))
    }

    /// Backend path for an update
    pub fn update_endpoint(&self, id: &RecordId) -> Result<String> {
        self.endpoints
            .update
            .map(|t| resolve(t, id))
            .ok_or_else(|| self.unsupported("update"))
    }

    /// Backend path for a delete
    pub fn delete_endpoint(&self, id: &RecordId) -> Result<String> {
        self.endpoints
            .delete
            .map(|t| resolve(t, id))
            .ok_or_else(|| self.unsupported("delete"))
    }

    fn unsupported(&self, operation: &'static str) -> Error {
        Error::UnsupportedOperation {
            entity: self.slug.to_string(),
            operation,
        }
    }
}

/// Percent-encode a record id for use in a URL path
pub fn encode_id(id: &RecordId) -> String {
    urlencoding::encode(&id.to_string()).into_owned()
}

fn resolve(template: &str, id: &RecordId) -> String {
    template.replace("{id}", &encode_id(id))
}

const BLOG_STATUS: &[SelectOption] = &[
    SelectOption::new("Draft", "Draft"),
    SelectOption::new("Published", "Published"),
];

const GALLERY_CATEGORIES: &[SelectOption] = &[
    SelectOption::new("programs", "Programs"),
    SelectOption::new("events", "Events"),
    SelectOption::new("convocations", "Convocations"),
    SelectOption::new("achievements", "Achievements"),
];

const TOP_CHOICE: &[SelectOption] = &[
    SelectOption::new("true", "Top choice"),
    SelectOption::new("false", "Other courses"),
];

const EVENT_STATUS: &[SelectOption] = &[
    SelectOption::new("true", "Active"),
    SelectOption::new("false", "Inactive"),
];

const CREATED: FieldSpec = FieldSpec::new("created_at", "Created", FieldKind::Date).read_only();
const UPDATED: FieldSpec = FieldSpec::new("updated_at", "Updated", FieldKind::Date).read_only();
const OPTIONAL_IMAGE: FieldKind = FieldKind::Image {
    required_on_create: false,
};
const REQUIRED_IMAGE: FieldKind = FieldKind::Image {
    required_on_create: true,
};

const PROGRAM_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", "Name", FieldKind::Text).required(),
    FieldSpec::new("code", "Code", FieldKind::Text).required(),
    FieldSpec::new("subtitle", "Subtitle", FieldKind::Text),
    FieldSpec::new("description", "Description", FieldKind::LongText),
    FieldSpec::new("duration", "Duration", FieldKind::Text),
    FieldSpec::new("eligibility", "Eligibility", FieldKind::Text),
    FieldSpec::new("rating", "Rating", FieldKind::Number),
    FieldSpec::new("students", "Students", FieldKind::Number),
    FieldSpec::new("modules", "Modules", FieldKind::Number),
    FieldSpec::new("specializations", "Specializations", FieldKind::CommaList),
    FieldSpec::new("image", "Image", OPTIONAL_IMAGE),
    CREATED,
];

static REGISTRY: &[EntitySchema] = &[
    EntitySchema {
        slug: "admission-leads",
        singular: "Admission Lead",
        plural: "Admission Leads",
        endpoints: Endpoints {
            list: "/api/leads/",
            detail: DetailSource::Remote("/api/leads/{id}/"),
            create: None,
            update: None,
            delete: Some("/api/leads/{id}/delete/"),
        },
        fields: &[
            FieldSpec::new("first_name", "First Name", FieldKind::Text).read_only(),
            FieldSpec::new("last_name", "Last Name", FieldKind::Text).read_only(),
            FieldSpec::new("email", "Email", FieldKind::Text).read_only(),
            FieldSpec::new("mobile_number", "Mobile", FieldKind::Text).read_only(),
            FieldSpec::new("interested_course", "Interested Course", FieldKind::Text).read_only(),
            CREATED,
        ],
        columns: &[
            "first_name",
            "last_name",
            "email",
            "mobile_number",
            "interested_course",
            "created_at",
        ],
        search_fields: &[
            "first_name",
            "last_name",
            "email",
            "mobile_number",
            "interested_course",
        ],
        category: Some(CategorySpec {
            field: "interested_course",
            label: "Course",
            options: CategoryOptions::Derived,
            server_param: None,
        }),
        idle_hint: "No admission leads have been submitted yet",
    },
    EntitySchema {
        slug: "contacts",
        singular: "Contact Message",
        plural: "Contact Messages",
        endpoints: Endpoints {
            list: "/api/contact/list/",
            detail: DetailSource::CachedList,
            create: None,
            update: None,
            delete: Some("/api/contact/delete/{id}/"),
        },
        fields: &[
            FieldSpec::new("name", "Name", FieldKind::Text).read_only(),
            FieldSpec::new("email", "Email", FieldKind::Text).read_only(),
            FieldSpec::new("phone", "Phone", FieldKind::Text).read_only(),
            FieldSpec::new("subject", "Subject", FieldKind::Text).read_only(),
            FieldSpec::new("message", "Message", FieldKind::LongText).read_only(),
            CREATED,
        ],
        columns: &["name", "email", "phone", "subject", "created_at"],
        search_fields: &["name", "email", "phone", "subject", "message"],
        category: None,
        idle_hint: "No contact messages have been submitted yet",
    },
    EntitySchema {
        slug: "courses",
        singular: "Course",
        plural: "Courses",
        endpoints: Endpoints {
            list: "/api/courses/",
            detail: DetailSource::Remote("/api/courses/{id}/"),
            create: Some("/api/courses/create"),
            update: Some("/api/courses/{id}/update/"),
            delete: Some("/api/courses/{id}/delete/"),
        },
        fields: &[
            FieldSpec::new("id", "Course ID", FieldKind::Text).required(),
            FieldSpec::new("title", "Title", FieldKind::Text).required(),
            FieldSpec::new("short_description", "Short Description", FieldKind::LongText),
            FieldSpec::new("category", "Category", FieldKind::Text),
            FieldSpec::new("duration", "Duration", FieldKind::Text),
            FieldSpec::new("level", "Level", FieldKind::Text),
            FieldSpec::new("mode", "Mode", FieldKind::Text),
            FieldSpec::new("certification", "Certification", FieldKind::Text),
            FieldSpec::new("overview", "Overview", FieldKind::LongText),
            FieldSpec::new("modules", "Modules", FieldKind::ModuleGroups),
            FieldSpec::new("career_opportunities", "Career Opportunities", FieldKind::CommaList),
            FieldSpec::new("tools", "Tools", FieldKind::CommaList),
            FieldSpec::new("highlights", "Highlights", FieldKind::CommaList),
            FieldSpec::new("image", "Image", OPTIONAL_IMAGE),
            FieldSpec::new("top_choice", "Top Choice", FieldKind::Boolean).read_only(),
            CREATED,
            UPDATED,
        ],
        columns: &["id", "title", "category", "duration", "top_choice"],
        search_fields: &["title", "short_description", "category"],
        category: Some(CategorySpec {
            field: "top_choice",
            label: "Top choice",
            options: CategoryOptions::Static(TOP_CHOICE),
            server_param: Some("top_choice"),
        }),
        idle_hint: "No courses have been added yet",
    },
    EntitySchema {
        slug: "blogs",
        singular: "Blog",
        plural: "Blogs",
        endpoints: Endpoints {
            list: "/api/admin/blogs/",
            detail: DetailSource::Remote("/api/admin/blogs/{id}/"),
            create: Some("/api/admin/blogs/create/"),
            update: Some("/api/admin/blogs/{id}/update/"),
            delete: Some("/api/admin/blogs/{id}/delete/"),
        },
        fields: &[
            FieldSpec::new("title", "Title", FieldKind::Text).required(),
            FieldSpec::new("date", "Date", FieldKind::Date).required(),
            FieldSpec::new("status", "Status", FieldKind::Select(BLOG_STATUS)),
            FieldSpec::new("content", "Content", FieldKind::LongText),
            FieldSpec::new("image", "Image", OPTIONAL_IMAGE),
            CREATED,
        ],
        columns: &["title", "date", "status"],
        search_fields: &["title", "date", "status"],
        category: Some(CategorySpec {
            field: "status",
            label: "Status",
            options: CategoryOptions::Static(BLOG_STATUS),
            server_param: None,
        }),
        idle_hint: "No blogs have been added yet",
    },
    EntitySchema {
        slug: "testimonials",
        singular: "Testimonial",
        plural: "Testimonials",
        endpoints: Endpoints {
            list: "/api/testimonials/",
            detail: DetailSource::Remote("/api/testimonials/{id}/"),
            create: Some("/api/testimonials/create/"),
            update: Some("/api/testimonials/{id}/update/"),
            delete: Some("/api/testimonials/{id}/delete/"),
        },
        fields: &[
            FieldSpec::new("name", "Name", FieldKind::Text).required(),
            FieldSpec::new("role", "Role", FieldKind::Text),
            FieldSpec::new("text", "Testimonial", FieldKind::LongText).required(),
            FieldSpec::new("image", "Photo", OPTIONAL_IMAGE),
            CREATED,
            UPDATED,
        ],
        columns: &["name", "role", "created_at"],
        search_fields: &["name", "role", "text"],
        category: None,
        idle_hint: "No testimonials have been added yet",
    },
    EntitySchema {
        slug: "gallery",
        singular: "Gallery Item",
        plural: "Gallery Items",
        endpoints: Endpoints {
            list: "/api/gallery/list/",
            detail: DetailSource::Remote("/api/gallery/{id}/"),
            create: Some("/api/gallery/create/"),
            update: Some("/api/gallery/{id}/update/"),
            delete: Some("/api/gallery/{id}/delete/"),
        },
        fields: &[
            FieldSpec::new("title", "Title", FieldKind::Text).required(),
            FieldSpec::new("category", "Category", FieldKind::Select(GALLERY_CATEGORIES))
                .required(),
            FieldSpec::new("date", "Date", FieldKind::Date),
            FieldSpec::new("image", "Image", REQUIRED_IMAGE),
            CREATED,
        ],
        columns: &["title", "category", "date"],
        search_fields: &["title"],
        category: Some(CategorySpec {
            field: "category",
            label: "Category",
            options: CategoryOptions::Static(GALLERY_CATEGORIES),
            server_param: Some("category"),
        }),
        idle_hint: "No gallery items have been added yet",
    },
    EntitySchema {
        slug: "placements",
        singular: "Placement",
        plural: "Placements",
        endpoints: Endpoints {
            list: "/api/placements/",
            detail: DetailSource::Remote("/api/placements/{id}/"),
            create: Some("/api/placements/create/"),
            update: Some("/api/placements/{id}/update/"),
            delete: Some("/api/placements/{id}/delete/"),
        },
        fields: &[
            FieldSpec::new("name", "Student Name", FieldKind::Text).required(),
            FieldSpec::new("role", "Role", FieldKind::Text),
            FieldSpec::new("company", "Company", FieldKind::Text).required(),
            FieldSpec::new("student_image", "Student Photo", OPTIONAL_IMAGE),
            FieldSpec::new("company_logo", "Company Logo", OPTIONAL_IMAGE),
            FieldSpec::new("background_image", "Background", OPTIONAL_IMAGE),
            CREATED,
        ],
        columns: &["name", "role", "company"],
        search_fields: &["name", "role", "company"],
        category: None,
        idle_hint: "No placements have been added yet",
    },
    EntitySchema {
        slug: "placement-posters",
        singular: "Placement Poster",
        plural: "Placement Posters",
        endpoints: Endpoints {
            list: "/api/placement-posters/",
            detail: DetailSource::Unavailable,
            create: Some("/api/placement-posters/create/"),
            update: None,
            delete: Some("/api/placement-posters/delete/{id}/"),
        },
        fields: &[
            FieldSpec::new("alt", "Alt Text", FieldKind::Text).required(),
            FieldSpec::new("image", "Poster", REQUIRED_IMAGE),
            CREATED,
        ],
        columns: &["alt", "created_at"],
        search_fields: &["alt"],
        category: None,
        idle_hint: "No placement posters have been added yet",
    },
    EntitySchema {
        slug: "faculty",
        singular: "Faculty Member",
        plural: "Faculty Members",
        endpoints: Endpoints {
            list: "/api/faculty/",
            detail: DetailSource::Remote("/api/faculty/{id}/"),
            create: Some("/api/faculty/create/"),
            update: Some("/api/faculty/update/{id}/"),
            delete: Some("/api/faculty/{id}/delete/"),
        },
        fields: &[
            FieldSpec::new("name", "Name", FieldKind::Text).required(),
            FieldSpec::new("title", "Title", FieldKind::Text),
            FieldSpec::new("faculty_image", "Photo", OPTIONAL_IMAGE),
            FieldSpec::new("bg_image", "Background", OPTIONAL_IMAGE),
            CREATED,
        ],
        columns: &["name", "title"],
        search_fields: &["name", "title"],
        category: None,
        idle_hint: "No faculty members have been added yet",
    },
    EntitySchema {
        slug: "ug-programs",
        singular: "UG Program",
        plural: "UG Programs",
        endpoints: Endpoints {
            list: "/api/ug-programs/",
            detail: DetailSource::Remote("/api/ug-programs/{id}/"),
            create: Some("/api/ug-programs/create/"),
            update: Some("/api/ug-programs/{id}/update/"),
            delete: Some("/api/ug-programs/{id}/delete/"),
        },
        fields: PROGRAM_FIELDS,
        columns: &["name", "code", "subtitle", "duration"],
        search_fields: &["name", "code", "subtitle"],
        category: None,
        idle_hint: "No UG programs have been added yet",
    },
    EntitySchema {
        slug: "pg-programs",
        singular: "PG Program",
        plural: "PG Programs",
        endpoints: Endpoints {
            list: "/api/pg-programs/",
            detail: DetailSource::Remote("/api/pg-programs/{id}/"),
            create: Some("/api/pg-programs/create/"),
            update: Some("/api/pg-programs/{id}/update/"),
            delete: Some("/api/pg-programs/{id}/delete/"),
        },
        fields: PROGRAM_FIELDS,
        columns: &["name", "code", "subtitle", "duration"],
        search_fields: &["name", "code", "subtitle"],
        category: None,
        idle_hint: "No PG programs have been added yet",
    },
    EntitySchema {
        slug: "events",
        singular: "Event",
        plural: "Events",
        endpoints: Endpoints {
            list: "/api/events/",
            detail: DetailSource::Remote("/api/events/{id}/"),
            create: Some("/api/events/create/"),
            update: Some("/api/events/{id}/update/"),
            delete: Some("/api/events/{id}/delete/"),
        },
        fields: &[
            FieldSpec::new("title", "Title", FieldKind::Text).required(),
            FieldSpec::new("date", "Date", FieldKind::Date).required(),
            FieldSpec::new("location", "Location", FieldKind::Text).required(),
            FieldSpec::new("phone_number", "Phone Number", FieldKind::Text).required(),
            FieldSpec::new(
                "registration_message",
                "Registration Message",
                FieldKind::LongText,
            )
            .required(),
            FieldSpec::new("description", "Description", FieldKind::LongText),
            FieldSpec::new("is_active", "Active", FieldKind::Boolean),
            CREATED,
        ],
        columns: &["title", "date", "location", "is_active"],
        search_fields: &["title", "location"],
        category: Some(CategorySpec {
            field: "is_active",
            label: "Status",
            options: CategoryOptions::Static(EVENT_STATUS),
            server_param: None,
        }),
        idle_hint: "No events have been added yet",
    },
    EntitySchema {
        slug: "edwin-talks",
        singular: "Edwin Talk",
        plural: "Edwin Talks",
        endpoints: Endpoints {
            list: "/api/edwintalks/",
            detail: DetailSource::Remote("/api/edwintalks/{id}/"),
            create: Some("/api/edwintalks/create/"),
            update: Some("/api/edwintalks/{id}/update/"),
            delete: Some("/api/edwintalks/{id}/delete/"),
        },
        fields: &[
            FieldSpec::new("title", "Title", FieldKind::Text).required(),
            FieldSpec::new("image", "Image", OPTIONAL_IMAGE),
            CREATED,
        ],
        columns: &["title", "created_at"],
        search_fields: &["title"],
        category: None,
        idle_hint: "No talks have been added yet",
    },
];

/// All registered entities, in navigation order
pub fn all() -> &'static [EntitySchema] {
    REGISTRY
}

/// Find an entity by slug
///
/// # Errors
///
/// Returns `Error::UnknownEntity` for unregistered slugs.
pub fn lookup(slug: &str) -> Result<&'static EntitySchema> {
    REGISTRY
        .iter()
        .find(|s| s.slug == slug)
        .ok_or_else(|| Error::UnknownEntity {
            slug: slug.to_string(),
        })
}
