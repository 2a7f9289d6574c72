//! Static outfit cards and their like toggles.

use serde::Serialize;

use crate::error::SessionError;

/// One statically defined outfit card.
#[derive(Debug, Clone, Serialize)]
pub struct OutfitCard {
    pub title: &'static str,
    pub items: &'static [&'static str],
    /// Star rating, 1-5.
    pub rating: u8,
    pub occasion: &'static str,
}

pub const OUTFITS: [OutfitCard; 4] = [
    OutfitCard {
        title: "Evening Elegance",
        items: &["Silk Blouse", "Tailored Pants", "Statement Heels"],
        rating: 4,
        occasion: "Formal Event",
    },
    OutfitCard {
        title: "Weekend Casual",
        items: &["Graphic Tee", "Distressed Jeans", "White Sneakers"],
        rating: 5,
        occasion: "Casual Outing",
    },
    OutfitCard {
        title: "Office Ready",
        items: &["Blazer", "Shell Top", "Pencil Skirt"],
        rating: 4,
        occasion: "Work Meeting",
    },
    OutfitCard {
        title: "Date Night",
        items: &["Wrap Dress", "Strappy Heels", "Delicate Jewelry"],
        rating: 5,
        occasion: "Romantic Dinner",
    },
];

/// A card together with its like state.
#[derive(Debug, Clone, Serialize)]
pub struct OutfitView {
    pub index: usize,
    #[serde(flatten)]
    pub card: OutfitCard,
    pub liked: bool,
}

/// One like flag per card in `OUTFITS`.
#[derive(Debug, Clone)]
pub struct OutfitBoard {
    likes: [bool; OUTFITS.len()],
}

impl Default for OutfitBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl OutfitBoard {
    pub fn new() -> Self {
        Self {
            likes: [false; OUTFITS.len()],
        }
    }

    /// Flip the like on card `index`. Returns the new state.
    pub fn toggle_like(&mut self, index: usize) -> Result<bool, SessionError> {
        let len = self.likes.len();
        let liked = self
            .likes
            .get_mut(index)
            .ok_or(SessionError::InvalidOutfit { index, len })?;
        *liked = !*liked;
        Ok(*liked)
    }

    pub fn view(&self) -> Vec<OutfitView> {
        OUTFITS
            .iter()
            .zip(self.likes)
            .enumerate()
            .map(|(index, (card, liked))| OutfitView {
                index,
                card: card.clone(),
                liked,
            })
            .collect()
    }
}
