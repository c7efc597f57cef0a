//! Fixed-width packet codec
//!
//! Pure functions between typed messages and their wire frames, plus the
//! splitter that demultiplexes a concatenated server response. The tag to
//! layout mapping is a static match; there is no runtime dispatch table to
//! drift out of sync with the types.

use crate::error::{AxeError, AxeResult};
use crate::fields::{
    validate, ORDER_NO_WIDTH, PRICE_WIDTH, QTY_WIDTH, TICKER_WIDTH,
};
use crate::message::{Message, MsgType, OrderAck, OrderFill, OrderInstruction, ResponseCode};

/// Encode a message into its wire frame
///
/// Fields are concatenated in the variant's declared order. Fails with
/// [`AxeError::Encoding`] if any field is not exactly its declared width of
/// decimal digits.
pub fn encode(message: &Message) -> AxeResult<Vec<u8>> {
    let mut out = Vec::with_capacity(message.msg_type().frame_len());
    out.push(message.msg_type().tag());

    match message {
        Message::NewOrder(m) | Message::CancelOrder(m) => {
            validate("order_no", &m.order_no, ORDER_NO_WIDTH)?;
            validate("ticker", &m.ticker, TICKER_WIDTH)?;
            validate("price", &m.price, PRICE_WIDTH)?;
            validate("qty", &m.qty, QTY_WIDTH)?;
            out.extend_from_slice(m.order_no.as_bytes());
            out.extend_from_slice(m.ticker.as_bytes());
            out.extend_from_slice(m.price.as_bytes());
            out.extend_from_slice(m.qty.as_bytes());
        }
        Message::OrderAck(m) => {
            validate("order_no", &m.order_no, ORDER_NO_WIDTH)?;
            out.extend_from_slice(m.order_no.as_bytes());
            out.extend_from_slice(m.response_code.as_str().as_bytes());
        }
        Message::OrderFill(m) => {
            validate("order_no", &m.order_no, ORDER_NO_WIDTH)?;
            validate("qty", &m.qty, QTY_WIDTH)?;
            out.extend_from_slice(m.order_no.as_bytes());
            out.extend_from_slice(m.qty.as_bytes());
        }
    }

    debug_assert_eq!(out.len(), message.msg_type().frame_len());
    Ok(out)
}

/// Decode a single message from the front of `buf`
///
/// `buf` must hold the full frame for the leading tag. Extra trailing bytes
/// are ignored; use [`split`] to walk a concatenated buffer.
pub fn decode_one(buf: &[u8]) -> AxeResult<Message> {
    let frame = frame_at(buf, 0)?;
    decode_frame(frame)
}

/// Split a buffer of concatenated frames into per-message slices
///
/// Returns a lazy iterator that peeks the leading tag of each frame, looks up
/// the variant's total length and cuts exactly that many bytes. An
/// unrecognized tag anywhere aborts the iteration with
/// [`AxeError::UnsupportedMessageType`]; nothing after it is emitted.
pub fn split(buf: &[u8]) -> PacketSplitter<'_> {
    PacketSplitter { buf, pos: 0, poisoned: false }
}

/// Decode every message in a concatenated buffer, in wire order
///
/// Message order is preserved end to end; acks must reach the ledger before
/// the fills and cancels that depend on a resolved order number.
pub fn decode_all(buf: &[u8]) -> AxeResult<Vec<Message>> {
    split(buf)
        .map(|frame| frame.and_then(decode_frame))
        .collect()
}

/// Iterator over the raw frames of a concatenated packet
///
/// Yields `Ok(&[u8])` per frame in order of appearance; finite and
/// non-restartable. After yielding an error the iterator is exhausted.
pub struct PacketSplitter<'a> {
    buf: &'a [u8],
    pos: usize,
    poisoned: bool,
}

impl<'a> Iterator for PacketSplitter<'a> {
    type Item = AxeResult<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned || self.pos >= self.buf.len() {
            return None;
        }
        match frame_at(self.buf, self.pos) {
            Ok(frame) => {
                self.pos += frame.len();
                Some(Ok(frame))
            }
            Err(e) => {
                self.poisoned = true;
                Some(Err(e))
            }
        }
    }
}

/// Cut the frame starting at `pos`, validating tag and length
fn frame_at(buf: &[u8], pos: usize) -> AxeResult<&[u8]> {
    let tag = *buf.get(pos).ok_or(AxeError::Truncated {
        tag: '?',
        expected: 1,
        remaining: 0,
    })?;

    let msg_type = MsgType::from_tag(tag).ok_or(AxeError::UnsupportedMessageType {
        tag: tag as char,
        offset: pos,
    })?;

    let len = msg_type.frame_len();
    let remaining = buf.len() - pos;
    if remaining < len {
        return Err(AxeError::Truncated {
            tag: tag as char,
            expected: len,
            remaining,
        });
    }
    Ok(&buf[pos..pos + len])
}

/// Decode one exact frame into a typed message
fn decode_frame(frame: &[u8]) -> AxeResult<Message> {
    // frame_at guarantees a known tag and full length
    let msg_type = match MsgType::from_tag(frame[0]) {
        Some(mt) => mt,
        None => {
            return Err(AxeError::UnsupportedMessageType {
                tag: frame[0] as char,
                offset: 0,
            })
        }
    };

    match msg_type {
        MsgType::NewOrder | MsgType::CancelOrder => {
            let instr = OrderInstruction {
                order_no: field_str(frame, 1, ORDER_NO_WIDTH, "order_no")?,
                ticker: field_str(frame, 6, TICKER_WIDTH, "ticker")?,
                price: field_str(frame, 12, PRICE_WIDTH, "price")?,
                qty: field_str(frame, 17, QTY_WIDTH, "qty")?,
            };
            Ok(if msg_type == MsgType::NewOrder {
                Message::NewOrder(instr)
            } else {
                Message::CancelOrder(instr)
            })
        }
        MsgType::OrderAck => {
            let order_no = field_str(frame, 1, ORDER_NO_WIDTH, "order_no")?;
            let response_code = ResponseCode::from_byte(frame[6]).ok_or_else(|| {
                AxeError::encoding(
                    "response_code",
                    format!("expected '0' or '1', got {:?}", frame[6] as char),
                )
            })?;
            Ok(Message::OrderAck(OrderAck {
                order_no,
                response_code,
            }))
        }
        MsgType::OrderFill => Ok(Message::OrderFill(OrderFill {
            order_no: field_str(frame, 1, ORDER_NO_WIDTH, "order_no")?,
            qty: field_str(frame, 6, QTY_WIDTH, "qty")?,
        })),
    }
}

/// Slice a fixed-width digit field out of a frame
fn field_str(frame: &[u8], start: usize, width: usize, name: &'static str) -> AxeResult<String> {
    let bytes = &frame[start..start + width];
    if !bytes.iter().all(|b| b.is_ascii_digit()) {
        return Err(AxeError::encoding(
            name,
            format!("expected decimal digits, got {:?}", String::from_utf8_lossy(bytes)),
        ));
    }
    // Validated ASCII above
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::ORDER_NO_UNASSIGNED;

    fn new_order() -> Message {
        Message::NewOrder(OrderInstruction::new("000660", "60000", "00020"))
    }

    #[test]
    fn test_encode_new_order() {
        let bytes = encode(&new_order()).unwrap();
        assert_eq!(bytes, b"0000000006606000000020");
        assert_eq!(bytes.len(), 22);
    }

    #[test]
    fn test_encode_rejects_bad_width() {
        let msg = Message::NewOrder(OrderInstruction::new("660", "60000", "00020"));
        let err = encode(&msg).unwrap_err();
        assert!(matches!(err, AxeError::Encoding { field: "ticker", .. }));
    }

    #[test]
    fn test_encode_rejects_non_digit_field() {
        let msg = Message::OrderFill(OrderFill {
            order_no: "0001a".to_string(),
            qty: "00010".to_string(),
        });
        assert!(encode(&msg).is_err());
    }

    #[test]
    fn test_round_trip_every_variant() {
        let messages = [
            new_order(),
            Message::CancelOrder(
                OrderInstruction::new("000660", "60000", "00010").with_order_no("00001"),
            ),
            Message::OrderAck(OrderAck {
                order_no: "00001".to_string(),
                response_code: ResponseCode::Success,
            }),
            Message::OrderAck(OrderAck {
                order_no: "00002".to_string(),
                response_code: ResponseCode::Fail,
            }),
            Message::OrderFill(OrderFill {
                order_no: "00001".to_string(),
                qty: "00010".to_string(),
            }),
        ];

        for msg in &messages {
            let bytes = encode(msg).unwrap();
            assert_eq!(bytes.len(), msg.msg_type().frame_len());
            let decoded = decode_one(&bytes).unwrap();
            assert_eq!(&decoded, msg);
        }
    }

    #[test]
    fn test_decode_unknown_tag() {
        let err = decode_one(b"900001").unwrap_err();
        assert!(matches!(
            err,
            AxeError::UnsupportedMessageType { tag: '9', offset: 0 }
        ));
    }

    #[test]
    fn test_decode_truncated_frame() {
        let err = decode_one(b"2000").unwrap_err();
        assert!(matches!(err, AxeError::Truncated { tag: '2', .. }));
    }

    #[test]
    fn test_split_concatenated_messages() {
        // ack + fill + ack batched into one read
        let packet = b"2000010300001000102000020";
        let frames: Vec<_> = split(packet).collect::<AxeResult<_>>().unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], b"2000010");
        assert_eq!(frames[1], b"30000100010");
        assert_eq!(frames[2], b"2000020");

        let messages = decode_all(packet).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].order_no(), "00001");
        assert_eq!(messages[1].order_no(), "00001");
        assert_eq!(messages[2].order_no(), "00002");
    }

    #[test]
    fn test_split_preserves_wire_order() {
        let mut packet = Vec::new();
        for no in ["00001", "00002", "00003"] {
            packet.extend_from_slice(
                &encode(&Message::OrderFill(OrderFill {
                    order_no: no.to_string(),
                    qty: "00001".to_string(),
                }))
                .unwrap(),
            );
        }
        let messages = decode_all(&packet).unwrap();
        let nos: Vec<_> = messages.iter().map(|m| m.order_no().to_string()).collect();
        assert_eq!(nos, ["00001", "00002", "00003"]);
    }

    #[test]
    fn test_split_corrupt_tag_aborts_mid_stream() {
        // valid ack, then garbage, then another valid ack that must NOT be emitted
        let packet = b"2000010X0000102000020";
        let mut splitter = split(packet);

        assert!(splitter.next().unwrap().is_ok());
        let err = splitter.next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            AxeError::UnsupportedMessageType { tag: 'X', offset: 7 }
        ));
        assert!(splitter.next().is_none());
    }

    #[test]
    fn test_split_empty_buffer() {
        assert_eq!(split(b"").count(), 0);
        assert!(decode_all(b"").unwrap().is_empty());
    }

    #[test]
    fn test_decode_client_send_form() {
        // order_no is all zeros before the server assigns one
        let msg = decode_one(b"0000000006606000000020").unwrap();
        match msg {
            Message::NewOrder(instr) => {
                assert_eq!(instr.order_no, ORDER_NO_UNASSIGNED);
                assert_eq!(instr.ticker, "000660");
                assert_eq!(instr.price, "60000");
                assert_eq!(instr.qty, "00020");
            }
            other => panic!("expected NewOrder, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_ack_invalid_response_code() {
        let err = decode_one(b"2000017").unwrap_err();
        assert!(matches!(err, AxeError::Encoding { field: "response_code", .. }));
    }
}
