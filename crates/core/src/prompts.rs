//! Fixed instructions sent to the two Gemini models and the structured
//! output schema for the identification step.

use serde_json::{json, Value};

/// Instruction for the edit model.
pub const EDIT_PROMPT: &str = "Analyze the context of this image \
(e.g., indoor room, outdoor garden, balcony). \
Based on the context and available empty space, add photorealistic, high-detail plants. \
If the space is large enough and the context is appropriate (like outdoors), \
you can also add suitable small trees. \
The result must be a sharp, high-resolution, high-quality photograph, \
with clear details suitable for zooming in.";

/// Instruction for the extraction model. Sent before the original and edited images.
pub const EXTRACTION_PROMPT: &str = "I have provided two images. \
The second is an edited version of the first, where plants or trees were added. \
Please identify only the plants or trees that were added. \
For each added item, provide its common name, a brief description, some simple care tips, \
and a normalized bounding box. \
The bounding box should have x, y, width, and height values between 0 and 1, \
where (x, y) is the top-left corner. \
Provide your response in the requested JSON format. \
If no plants or trees were added or you cannot identify them, return an empty list.";

/// Response schema for the extraction model (OpenAPI subset understood by Gemini).
pub fn flora_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "flora": {
                "type": "ARRAY",
                "description": "A list of plants or trees identified in the image.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": {
                            "type": "STRING",
                            "description": "The common name of the plant or tree."
                        },
                        "description": {
                            "type": "STRING",
                            "description": "A brief description of the plant or tree."
                        },
                        "care_tips": {
                            "type": "STRING",
                            "description": "Simple care instructions for the plant or tree."
                        },
                        "boundingBox": {
                            "type": "OBJECT",
                            "description": "Normalized coordinates of the item's location.",
                            "properties": {
                                "x": { "type": "NUMBER" },
                                "y": { "type": "NUMBER" },
                                "width": { "type": "NUMBER" },
                                "height": { "type": "NUMBER" }
                            },
                            "required": ["x", "y", "width", "height"]
                        }
                    },
                    "required": ["name", "description", "care_tips", "boundingBox"]
                }
            }
        },
        "required": ["flora"]
    })
}
