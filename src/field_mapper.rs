use crate::models::*;

/// Form-encoded YGL request body, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamForm(Vec<(&'static str, String)>);

impl UpstreamForm {
    /// Starts a form carrying the API key, which YGL expects on every call.
    pub fn with_api_key(api_key: &str) -> Self {
        Self(vec![("api_key", api_key.to_string())])
    }

    pub fn set(&mut self, name: &'static str, value: impl ToString) -> &mut Self {
        self.0.push((name, value.to_string()));
        self
    }

    /// Absent values are left out of the form entirely.
    pub fn opt<T: ToString>(&mut self, name: &'static str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.set(name, value);
        }
        self
    }

    pub fn flag(&mut self, name: &'static str, value: bool) -> &mut Self {
        self.set(name, if value { "1" } else { "0" })
    }

    /// Comma-joined; an empty list is omitted.
    pub fn list(&mut self, name: &'static str, values: &[String]) -> &mut Self {
        if !values.is_empty() {
            self.set(name, values.join(","));
        }
        self
    }

    pub fn paging(&mut self, paging: &Paging) -> &mut Self {
        self.set("page", paging.page).set("page_count", paging.page_size)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Translation of a validated request into YGL's field names.
pub trait ToUpstreamForm {
    fn to_form(&self, api_key: &str) -> UpstreamForm;
}

impl ToUpstreamForm for RentalSearch {
    fn to_form(&self, api_key: &str) -> UpstreamForm {
        let mut form = UpstreamForm::with_api_key(api_key);
        form.opt("min_bed", self.beds_min)
            .opt("max_bed", self.beds_max)
            .opt("min_bath", self.baths_min)
            .opt("max_bath", self.baths_max)
            .opt("min_rent", self.rent_min)
            .opt("max_rent", self.rent_max)
            .list("neighborhood", &self.neighborhoods)
            .opt("avail_from", self.availability_start.map(|d| d.format("%Y-%m-%d")))
            .opt("avail_to", self.availability_end.map(|d| d.format("%Y-%m-%d")))
            // "any" is YGL's behavior when the filter is missing
            .opt(
                "fee",
                self.fee.filter(|fee| *fee != Fee::Any).map(|fee| fee.as_str()),
            )
            .opt("keyword", self.keyword.as_deref());
        if let Some(order_by) = self.order_by {
            form.set("sort_name", order_by.sort_name())
                .set("sort_dir", order_by.sort_dir());
        }
        form.flag("include_photos", self.include_photos)
            .paging(&self.paging);
        form
    }
}

impl ToUpstreamForm for AgentSearch {
    fn to_form(&self, api_key: &str) -> UpstreamForm {
        let mut form = UpstreamForm::with_api_key(api_key);
        form.opt("id", self.id.as_deref())
            .opt("name", self.name.as_deref())
            .opt("email", self.email.as_deref())
            .flag("active_only", self.active_only)
            .paging(&self.paging);
        form
    }
}

impl ToUpstreamForm for LandlordSearch {
    fn to_form(&self, api_key: &str) -> UpstreamForm {
        let mut form = UpstreamForm::with_api_key(api_key);
        form.list("landlord_id", &self.landlord_ids)
            .opt("name", self.name.as_deref())
            .opt("city", self.city.as_deref())
            .paging(&self.paging);
        form
    }
}

impl ToUpstreamForm for Lead {
    fn to_form(&self, api_key: &str) -> UpstreamForm {
        let mut form = UpstreamForm::with_api_key(api_key);
        form.set("first_name", &self.first_name)
            .opt("last_name", self.last_name.as_deref())
            .set("email", &self.email)
            .opt("phone", self.phone.as_deref())
            .opt("message", self.message.as_deref())
            .set("source", &self.source);
        form
    }
}
