//! Catalog records as served by the admin API.
//!
//! Field names follow the admin API's camelCase JSON. Unknown fields are
//! ignored so that catalog additions don't break cart rehydration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{AttributeId, BillboardId, CategoryId, ImageId, ProductId};
use super::price::Price;

/// A travel activity kit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price in rupees. The API sends decimals as strings.
    pub price: Decimal,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<Attribute>,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl Product {
    /// Unit price in the store currency.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::inr(self.price)
    }

    /// URL of the first image, used as the thumbnail.
    #[must_use]
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.images.first().map(|image| image.url.as_str())
    }
}

/// A product category with its hero billboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billboard: Option<Billboard>,
}

/// Banner image shown at the top of a category page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Billboard {
    pub id: BillboardId,
    pub label: String,
    pub image_url: String,
}

/// A filterable product attribute: size, age range, duration or destination.
///
/// All four share the same `{id, name, value}` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub name: String,
    pub value: String,
}

/// A product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,
    pub url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_api_product() {
        let json = r#"{
            "id": "p1",
            "name": "Beach Explorer Kit",
            "price": "799.00",
            "isFeatured": true,
            "storeId": "ignored",
            "category": {"id": "c1", "name": "Kits", "billboard": {"id": "b1", "label": "Summer", "imageUrl": "https://img/b1.png"}},
            "size": {"id": "s1", "name": "Small", "value": "S"},
            "age": {"id": "a1", "name": "Toddler", "value": "2-4"},
            "duration": {"id": "d1", "name": "Weekend", "value": "2 days"},
            "destination": {"id": "x1", "name": "Beach", "value": "beach"},
            "images": [{"id": "i1", "url": "https://img/1.png"}]
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "p1");
        assert_eq!(product.price, Decimal::new(799, 0));
        assert!(product.is_featured);
        assert_eq!(product.thumbnail_url(), Some("https://img/1.png"));
        assert_eq!(
            product.category.unwrap().billboard.unwrap().image_url,
            "https://img/b1.png"
        );
    }

    #[test]
    fn test_deserialize_numeric_price_and_missing_attributes() {
        let product: Product =
            serde_json::from_str(r#"{"id": "p2", "name": "Mini Kit", "price": 250}"#).unwrap();
        assert_eq!(product.price, Decimal::new(250, 0));
        assert!(product.size.is_none());
        assert!(product.images.is_empty());
        assert_eq!(product.thumbnail_url(), None);
    }
}
