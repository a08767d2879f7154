use futures::StreamExt;
use redraft_core_types::{AnalysisPayload, StreamFrame};
use redraft_transport::{decode_frames, encode_frame};

#[tokio::test]
async fn encoded_stream_survives_arbitrary_chunking() {
    let analysis = AnalysisPayload {
        text_type: Some("email".into()),
        ..Default::default()
    }
    .into_result("Hi team", None);

    let frames = vec![
        StreamFrame::conversation("Looks like an email"),
        StreamFrame::CleanupMarkers {
            markers: ["---ANALYSIS_DATA_START---".to_string()].into_iter().collect(),
        },
        StreamFrame::analysis_complete(analysis),
        StreamFrame::Done,
    ];

    let body: Vec<u8> = frames
        .iter()
        .map(|frame| encode_frame(frame).unwrap())
        .collect::<String>()
        .into_bytes();

    for chunk_size in [1, 3, 7, 64] {
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> =
            body.chunks(chunk_size).map(|c| Ok(c.to_vec())).collect();
        let decoded: Vec<StreamFrame> = decode_frames(futures::stream::iter(chunks))
            .map(|frame| frame.unwrap())
            .collect()
            .await;
        assert_eq!(decoded, frames, "chunk size {}", chunk_size);
    }
}
